use simreel::{
    ArmModel, Fps, RecordOpts, SimData, SimulationState, StateSampler, record, should_capture,
};

fn arm() -> ArmModel {
    ArmModel::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/arm.json")).unwrap()
}

#[test]
fn buffer_length_tracks_duration_times_fps() {
    let mut model = arm();
    for (fps, timestep, duration) in [
        (60, 0.002, 1.0),
        (30, 0.001, 2.0),
        (24, 0.005, 1.5),
        (50, 0.0025, 0.5),
    ] {
        model.timestep = timestep;
        let mut data = SimData::new(&model);
        let fps = Fps::new(fps).unwrap();
        let rec = record(
            &model,
            &mut data,
            &RecordOpts {
                fps,
                duration,
                probe: None,
            },
        )
        .unwrap();

        let expected = (duration * fps.as_f64()).floor() as i64;
        let got = rec.states.len() as i64;
        assert!(
            (got - expected).abs() <= 1,
            "fps={} dt={timestep}: got {got}, expected {expected}",
            fps.get()
        );
    }
}

#[test]
fn states_are_strictly_ordered_and_spaced_about_one_frame_apart() {
    let model = arm();
    let mut data = SimData::new(&model);
    let fps = Fps::new(60).unwrap();
    let rec = record(
        &model,
        &mut data,
        &RecordOpts {
            fps,
            duration: 1.0,
            probe: None,
        },
    )
    .unwrap();

    let states = rec.states.as_slice();
    for (i, pair) in states.windows(2).enumerate() {
        let gap = pair[1].time() - pair[0].time();
        assert!(gap > 0.0);
        assert!(
            (gap - fps.frame_duration_secs()).abs() <= model.timestep + 1e-12,
            "gap {gap} at {i}"
        );
        assert_eq!(pair[0].capture_index() + 1, pair[1].capture_index());
    }
}

#[test]
fn coarse_timestep_captures_every_step_without_duplicates() {
    let fps = Fps::new(60).unwrap();
    let dt = 0.05;
    let mut sampler = StateSampler::new(fps, 0.0);
    for step in 1..=20u32 {
        let now = f64::from(step) * dt;
        let taken = sampler.observe(now, |i| SimulationState::new(i, vec![now]));
        assert!(taken, "step {step} should capture");
    }
    assert_eq!(sampler.captured(), 20);
    let times: Vec<f64> = sampler.buffer().iter().map(|s| s.time()).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn predicate_matches_floor_rule() {
    let fps = Fps::new(60).unwrap();
    assert!(!should_capture(0.0, fps, 0));
    assert!(!should_capture(0.016, fps, 0));
    assert!(should_capture(0.017, fps, 0));
    assert!(!should_capture(0.017, fps, 1));
    assert!(should_capture(1.0, fps, 59));
    assert!(!should_capture(f64::NAN, fps, 0));
}
