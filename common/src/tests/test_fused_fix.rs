use crate::position::{FusedFix, FusionOutput};
use crate::test_helper::fix::fix_at;

#[test]
fn default_missing_heading_on_the_wire_only() {
    let fused = FusedFix::from(fix_at(52.0, 11.0, None, 0));
    assert_eq!(fused.heading, None);
    assert_eq!(fused.as_wire(), [52.0, 11.0, 0.0]);
}

#[test]
fn keep_reported_heading_on_the_wire() {
    let fused = FusedFix::from(fix_at(52.0, 11.0, Some(84.5), 0));
    assert_eq!(fused.as_wire(), [52.0, 11.0, 84.5]);
}

#[test]
fn no_fix_has_no_position() {
    assert!(FusionOutput::NoFix.fix().is_none());
}
