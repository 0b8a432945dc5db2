mod common;

use airglow_core::classify::classify;
use airglow_core::exposure::{Bank, ChannelId, Exposure};

use common::{add_labeled, chan, uniform_cube};

// ---------------------------------------------------------------------------
// Bank layout: 24 channels in three banks of eight
// ---------------------------------------------------------------------------

#[test]
fn test_bank_assignment() {
    assert_eq!(chan(1).bank(), Bank::One);
    assert_eq!(chan(8).bank(), Bank::One);
    assert_eq!(chan(9).bank(), Bank::Two);
    assert_eq!(chan(16).bank(), Bank::Two);
    assert_eq!(chan(17).bank(), Bank::Three);
    assert_eq!(chan(24).bank(), Bank::Three);
}

#[test]
fn test_channel_index_bounds() {
    assert!(ChannelId::new(0).is_err());
    assert!(ChannelId::new(25).is_err());
    assert!(ChannelId::new(1).is_ok());
    assert!(ChannelId::new(24).is_ok());
}

#[test]
fn test_all_channels_cover_banks_evenly() {
    let mut counts = [0usize; 3];
    for id in ChannelId::all() {
        counts[id.bank().index()] += 1;
    }
    assert_eq!(counts, [8, 8, 8]);
}

// ---------------------------------------------------------------------------
// Label rules: "S1"/"S3" mark blank sky, "S2" marks a reference target
// ---------------------------------------------------------------------------

#[test]
fn test_sky_labels_detected() {
    let mut exposure = Exposure::new("labels");
    add_labeled(&mut exposure, 1, "FIELD3_S1", uniform_cube(4, 2, 2, 1.0));
    add_labeled(&mut exposure, 2, "FIELD3_S3", uniform_cube(4, 2, 2, 1.0));
    add_labeled(&mut exposure, 3, "FIELD3_OBJ", uniform_cube(4, 2, 2, 1.0));

    let classes = classify(&exposure);
    assert!(classes.get(chan(1)).sky_reference);
    assert!(classes.get(chan(2)).sky_reference);
    assert!(!classes.get(chan(3)).sky_reference);
}

#[test]
fn test_sky_label_substring_anywhere() {
    let mut exposure = Exposure::new("substring");
    add_labeled(&mut exposure, 5, "XS1Y", uniform_cube(4, 2, 2, 1.0));
    let classes = classify(&exposure);
    assert!(classes.get(chan(5)).sky_reference);
}

#[test]
fn test_sky_label_case_sensitive() {
    // Lowercase "s1" is a different name, not a sky arm.
    let mut exposure = Exposure::new("case");
    add_labeled(&mut exposure, 4, "field_s1", uniform_cube(4, 2, 2, 1.0));
    let classes = classify(&exposure);
    assert!(!classes.get(chan(4)).sky_reference);
}

#[test]
fn test_special_reference_label() {
    let mut exposure = Exposure::new("special");
    add_labeled(&mut exposure, 6, "REFSTAR_S2", uniform_cube(4, 2, 2, 1.0));
    add_labeled(&mut exposure, 7, "GAL_7", uniform_cube(4, 2, 2, 1.0));

    let classes = classify(&exposure);
    assert!(classes.get(chan(6)).special_reference);
    assert!(!classes.get(chan(6)).sky_reference);
    assert!(!classes.get(chan(7)).special_reference);
}

#[test]
fn test_label_can_be_both_sky_and_special() {
    let mut exposure = Exposure::new("both");
    add_labeled(&mut exposure, 8, "S1_AND_S2", uniform_cube(4, 2, 2, 1.0));
    let classes = classify(&exposure);
    let class = classes.get(chan(8));
    assert!(class.sky_reference);
    assert!(class.special_reference);
}

// ---------------------------------------------------------------------------
// Channels without data never qualify as references
// ---------------------------------------------------------------------------

#[test]
fn test_labeled_but_empty_channel_not_sky() {
    let mut exposure = Exposure::new("empty");
    exposure.set_target_name(chan(2), "GHOST_S1");
    add_labeled(&mut exposure, 1, "FIELD_S1", uniform_cube(4, 2, 2, 1.0));

    let classes = classify(&exposure);
    assert!(!classes.get(chan(2)).has_data);
    assert!(!classes.get(chan(2)).sky_reference);
    assert!(classes.get(chan(1)).sky_reference);
}

#[test]
fn test_unnamed_channel_not_sky() {
    let mut exposure = Exposure::new("unnamed");
    exposure.set_channel(
        chan(1),
        airglow_core::exposure::Channel::new(uniform_cube(4, 2, 2, 1.0), common::test_axis()),
    );
    let classes = classify(&exposure);
    assert!(classes.get(chan(1)).has_data);
    assert!(!classes.get(chan(1)).sky_reference);
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

#[test]
fn test_sky_reference_ids_sorted_and_complete() {
    let mut exposure = Exposure::new("ids");
    add_labeled(&mut exposure, 19, "F_S3", uniform_cube(4, 2, 2, 1.0));
    add_labeled(&mut exposure, 3, "F_S1", uniform_cube(4, 2, 2, 1.0));
    add_labeled(&mut exposure, 11, "F_S2", uniform_cube(4, 2, 2, 1.0));

    let classes = classify(&exposure);
    let ids: Vec<u8> = classes.sky_reference_ids().map(|id| id.get()).collect();
    assert_eq!(ids, vec![3, 19]);
    assert!(classes.has_sky_reference());
}

#[test]
fn test_no_sky_reference() {
    let mut exposure = Exposure::new("none");
    add_labeled(&mut exposure, 1, "GAL_1", uniform_cube(4, 2, 2, 1.0));
    let classes = classify(&exposure);
    assert!(!classes.has_sky_reference());
    assert_eq!(classes.sky_reference_ids().count(), 0);
}
