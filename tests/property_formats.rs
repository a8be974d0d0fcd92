use std::time::Duration;

use proptest::prelude::*;

use hangwatch::diagnostics::{BLOCK_SEPARATOR, render_block};
use hangwatch::types::{HumanDuration, parse_duration};

proptest! {
    #[test]
    fn durations_scale_by_unit(value in 0u64..1_000_000) {
        prop_assert_eq!(parse_duration(&format!("{value}ms")), Ok(Duration::from_millis(value)));
        prop_assert_eq!(parse_duration(&format!("{value}s")), Ok(Duration::from_secs(value)));
        prop_assert_eq!(parse_duration(&format!(" {value}m ")), Ok(Duration::from_secs(value * 60)));
        prop_assert_eq!(parse_duration(&format!("{value}H")), Ok(Duration::from_secs(value * 3600)));
    }

    #[test]
    fn displayed_durations_parse_back(millis in 0u64..10_000_000) {
        let d = HumanDuration(Duration::from_millis(millis));
        prop_assert_eq!(d.to_string().parse::<HumanDuration>(), Ok(d));
    }

    #[test]
    fn bare_numbers_and_unknown_units_are_rejected(value in 0u64..1000, unit in "[a-gi-ln-rt-z]{1,3}") {
        prop_assert!(parse_duration(&value.to_string()).is_err());
        let with_unit = format!("{value}{unit}");
        prop_assert!(parse_duration(&with_unit).is_err());
    }

    #[test]
    fn blocks_are_labelled_and_terminated(pid in any::<u32>(), stacks in "[ -~\n]{0,200}") {
        let block = render_block(pid, &stacks);
        let header = format!("Process {pid}\n");
        let trailer = format!("\n{BLOCK_SEPARATOR}\n");

        prop_assert!(block.starts_with(&header));
        prop_assert!(block.ends_with(&trailer));
        prop_assert!(block.contains(&stacks));
        prop_assert_eq!(block.matches(BLOCK_SEPARATOR).count(), stacks.matches(BLOCK_SEPARATOR).count() + 1);
    }
}

#[test]
fn overflowing_durations_are_rejected() {
    assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    assert!(parse_duration("").is_err());
}
