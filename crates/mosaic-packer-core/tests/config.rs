use mosaic_packer_core::prelude::*;
use mosaic_packer_core::{MosaicError, SCALE_CASCADE};

#[test]
fn test_defaults() {
    let cfg = MosaicConfig::default();
    assert_eq!(cfg.tile_size, 110);
    assert_eq!(cfg.spacing_percent, 0);
    assert_eq!(cfg.overlap_percent, 25);
    assert_eq!(cfg.exhaustion, ExhaustionPolicy::StopRow);
    assert!(cfg.validate().is_ok());
    assert_eq!(SCALE_CASCADE, [1.0, 0.75, 0.55, 0.35]);
}

#[test]
fn test_builder_sets_fields() {
    let cfg = MosaicConfig::builder()
        .tile_size(90)
        .spacing_percent(10)
        .overlap_percent(35)
        .exhaustion(ExhaustionPolicy::StopPass)
        .build();
    assert_eq!(
        cfg,
        MosaicConfig {
            tile_size: 90,
            spacing_percent: 10,
            overlap_percent: 35,
            exhaustion: ExhaustionPolicy::StopPass,
        }
    );
}

#[test]
fn test_validate_ranges() {
    let bad_tile = MosaicConfig::builder().tile_size(0).build();
    match bad_tile.validate() {
        Err(MosaicError::InvalidConfig(msg)) => assert!(msg.contains("tile_size")),
        other => panic!("unexpected {other:?}"),
    }
    let bad_spacing = MosaicConfig::builder().spacing_percent(31).build();
    match bad_spacing.validate() {
        Err(MosaicError::InvalidConfig(msg)) => assert!(msg.contains("spacing_percent")),
        other => panic!("unexpected {other:?}"),
    }
    let bad_overlap = MosaicConfig::builder().overlap_percent(51).build();
    match bad_overlap.validate() {
        Err(MosaicError::InvalidConfig(msg)) => assert!(msg.contains("overlap_percent")),
        other => panic!("unexpected {other:?}"),
    }
    let edge = MosaicConfig::builder()
        .tile_size(1)
        .spacing_percent(30)
        .overlap_percent(50)
        .build();
    assert!(edge.validate().is_ok());
}

#[test]
fn test_policy_from_str() {
    assert_eq!("row".parse::<ExhaustionPolicy>(), Ok(ExhaustionPolicy::StopRow));
    assert_eq!("STOP_ROW".parse::<ExhaustionPolicy>(), Ok(ExhaustionPolicy::StopRow));
    assert_eq!("pass".parse::<ExhaustionPolicy>(), Ok(ExhaustionPolicy::StopPass));
    assert_eq!("stop_pass".parse::<ExhaustionPolicy>(), Ok(ExhaustionPolicy::StopPass));
    assert_eq!("column".parse::<ExhaustionPolicy>(), Err(()));
}

#[test]
fn test_serde_defaults() {
    let cfg: MosaicConfig =
        serde_json::from_str(r#"{"tile_size":70,"spacing_percent":5,"overlap_percent":15}"#)
            .unwrap();
    assert_eq!(cfg.exhaustion, ExhaustionPolicy::StopRow);
    let cfg: MosaicConfig = serde_json::from_str(
        r#"{"tile_size":70,"spacing_percent":5,"overlap_percent":15,"exhaustion":"stop_pass"}"#,
    )
    .unwrap();
    assert_eq!(cfg.exhaustion, ExhaustionPolicy::StopPass);

    let ranker: RankerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(ranker, RankerConfig::default());
    assert_eq!(ranker.tile_sizes, vec![70, 90, 110, 130, 150]);
    assert_eq!(ranker.overlap_percents, vec![15, 25, 35]);
    assert_eq!(ranker.top_n, 5);
}

#[test]
fn test_candidates_are_tile_major() {
    let cands = RankerConfig::default().candidates();
    assert_eq!(cands.len(), 15);
    let pairs: Vec<(u32, u32)> = cands
        .iter()
        .take(4)
        .map(|c| (c.tile_size, c.overlap_percent))
        .collect();
    assert_eq!(pairs, vec![(70, 15), (70, 25), (70, 35), (90, 15)]);
}
