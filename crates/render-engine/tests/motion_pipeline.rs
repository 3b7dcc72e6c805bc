use motionx_common::error::MotionError;
use motionx_frame_model::{Frame, OffsetSpec, PixelFormat, VideoInfo};
use motionx_processing_core::ToneCurve;
use motionx_render_engine::{
    plan_extraction, run_extraction, CompositeMode, FrameSink, MemorySink, MemorySource,
};

/// Ten 6x4 frames with a bright square sliding one pixel right per frame.
fn sliding_square() -> Vec<Frame> {
    (0..10u32)
        .map(|i| {
            let mut data = vec![20u8; 6 * 4 * 3];
            for y in 1..3u32 {
                let x = i % 5;
                let start = ((y * 6 + x) * 3) as usize;
                data[start..start + 3].copy_from_slice(&[240, 240, 240]);
            }
            Frame::new(6, 4, PixelFormat::Bgr24, data).unwrap()
        })
        .collect()
}

fn fnv1a_64(bytes: impl IntoIterator<Item = u8>) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn one_second_offset_on_one_second_video_is_rejected() {
    let info = VideoInfo::new(6, 4, 10.0, 10);
    let err = plan_extraction(&info, OffsetSpec::Seconds(1.0), CompositeMode::ToneMapped)
        .unwrap_err();
    assert!(matches!(err, MotionError::OffsetTooLarge { .. }));
    assert!(err.is_setup_error());
}

#[test]
fn half_second_offset_emits_five_frames() {
    let mut source = MemorySource::from_frames(sliding_square(), 10.0).unwrap();
    let config = plan_extraction(
        &VideoInfo::new(6, 4, 10.0, 10),
        OffsetSpec::Seconds(0.5),
        CompositeMode::ToneMapped,
    )
    .unwrap();
    assert_eq!(config.delay, 5);

    let mut sink = MemorySink::new();
    let summary = run_extraction(
        &mut source,
        &mut sink,
        config,
        ToneCurve::with_defaults(),
        None,
        None,
    )
    .unwrap();

    assert_eq!(summary.frames_read, 10);
    assert_eq!(summary.frames_written, 5);
    assert_eq!(summary.frames_buffered, 5);
    assert!(!summary.cancelled);
    assert!(sink.is_finished());
    let indices: Vec<u64> = sink.frames().iter().map(Frame::index).collect();
    assert_eq!(indices, vec![5, 6, 7, 8, 9]);
}

#[test]
fn square_five_frames_apart_repeats_so_output_is_flat() {
    // The square wraps every five frames, so a five-frame delay sees no motion.
    let mut source = MemorySource::from_frames(sliding_square(), 10.0).unwrap();
    let mut sink = MemorySink::new();
    let config = plan_extraction(
        &VideoInfo::new(6, 4, 10.0, 10),
        OffsetSpec::Frames(5),
        CompositeMode::ToneMapped,
    )
    .unwrap();
    run_extraction(&mut source, &mut sink, config, ToneCurve::identity(), None, None).unwrap();

    for frame in sink.frames() {
        assert!(frame.data().iter().all(|&v| v == 128));
    }
}

#[test]
fn overlay_marks_moving_square() {
    let frames = sliding_square();
    let background = frames[0].pixel(5, 0).unwrap().to_vec();
    let mut source = MemorySource::from_frames(frames, 10.0).unwrap();
    let mut sink = MemorySink::new();
    let config = plan_extraction(
        &VideoInfo::new(6, 4, 10.0, 10),
        OffsetSpec::Frames(1),
        CompositeMode::Overlay,
    )
    .unwrap();
    run_extraction(&mut source, &mut sink, config, ToneCurve::identity(), None, None).unwrap();

    let out = sink.into_frames();
    assert_eq!(out.len(), 9);
    // Column 1 brightened between frames 0 and 1. The blurred mask is 56
    // there, OR-ed onto the square's 240.
    assert_eq!(out[0].pixel(1, 1), Some(&[248u8, 248, 248][..]));
    // Column 0 darkened, which stays under the threshold, but the blur
    // bleeds the neighbouring mask into it.
    assert_eq!(out[0].pixel(0, 1), Some(&[60u8, 60, 60][..]));
    // Far corner never moves: background untouched.
    assert_eq!(out[0].pixel(5, 0), Some(background.as_slice()));
}

#[test]
fn overlay_runs_are_reproducible() {
    let run = || {
        let mut source = MemorySource::from_frames(sliding_square(), 10.0).unwrap();
        let mut sink = MemorySink::new();
        let config = plan_extraction(
            &VideoInfo::new(6, 4, 10.0, 10),
            OffsetSpec::Frames(2),
            CompositeMode::Overlay,
        )
        .unwrap();
        run_extraction(&mut source, &mut sink, config, ToneCurve::identity(), None, None)
            .unwrap();
        fnv1a_64(sink.into_frames().into_iter().flat_map(Frame::into_data))
    };
    assert_eq!(run(), run());
}

#[test]
fn zero_offset_compares_with_first_frame() {
    let mut source = MemorySource::from_frames(sliding_square(), 10.0).unwrap();
    let mut sink = MemorySink::new();
    let config = plan_extraction(
        &VideoInfo::new(6, 4, 10.0, 10),
        OffsetSpec::Frames(0),
        CompositeMode::ToneMapped,
    )
    .unwrap();
    run_extraction(&mut source, &mut sink, config, ToneCurve::identity(), None, None).unwrap();

    let out = sink.frames();
    assert_eq!(out.len(), 10);
    assert!(out[0].data().iter().all(|&v| v == 128));
    // Frame 5 wraps back to the first position.
    assert!(out[5].data().iter().all(|&v| v == 128));
    assert!(out[1].data().iter().any(|&v| v != 128));
}

struct FailingSink {
    accepted: usize,
    limit: usize,
}

impl FrameSink for FailingSink {
    fn write_frame(&mut self, _frame: &Frame) -> motionx_common::MotionResult<()> {
        if self.accepted == self.limit {
            return Err(MotionError::encode("disk full"));
        }
        self.accepted += 1;
        Ok(())
    }
}

#[test]
fn sink_failure_aborts_run() {
    let mut source = MemorySource::from_frames(sliding_square(), 10.0).unwrap();
    let mut sink = FailingSink {
        accepted: 0,
        limit: 2,
    };
    let config = plan_extraction(
        &VideoInfo::new(6, 4, 10.0, 10),
        OffsetSpec::Frames(0),
        CompositeMode::ToneMapped,
    )
    .unwrap();
    let err = run_extraction(&mut source, &mut sink, config, ToneCurve::identity(), None, None)
        .unwrap_err();
    assert!(matches!(err, MotionError::Encode { .. }));
    assert_eq!(sink.accepted, 2);
    assert_eq!(source.remaining(), 7);
}
