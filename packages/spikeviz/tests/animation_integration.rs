use std::path::Path;
use std::time::Duration;

use spikeviz::export::{self, find_ffmpeg, frame_path};
use spikeviz::{
    animate_cube, animate_spike_activity, ActivityOptions, ActivityTable, CubeOptions,
    ExportOptions, FieldCube, FigureStyle, FrameSink, Player, PresentedFrame, Quantity,
    QuantityArray, SinkStatus, SpikeTrain, Unit, VizError,
};

/// Records what the player shows; closes after `close_after` frames when set
#[derive(Default)]
struct RecordingSink {
    indices: Vec<Option<usize>>,
    delays: Vec<Duration>,
    captions: Vec<String>,
    close_after: Option<usize>,
}

impl FrameSink for RecordingSink {
    fn present(&mut self, frame: &PresentedFrame<'_>) -> spikeviz::Result<SinkStatus> {
        assert_eq!(
            frame.rgb.len(),
            frame.width as usize * frame.height as usize * 3
        );
        self.indices.push(frame.index);
        self.delays.push(frame.delay);
        self.captions.push(frame.caption.to_string());
        match self.close_after {
            Some(n) if self.indices.len() >= n => Ok(SinkStatus::Closed),
            _ => Ok(SinkStatus::Open),
        }
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bare_figure() -> FigureStyle {
    FigureStyle {
        width: 64,
        height: 48,
        annotate: false,
        ..FigureStyle::default()
    }
}

fn small_cube() -> FieldCube {
    FieldCube::from_nested(vec![
        vec![vec![-1.0, 0.0], vec![0.5, 1.0]],
        vec![vec![0.0, 0.0], vec![0.0, 0.0]],
        vec![vec![1.0, -0.5], vec![0.25, -1.0]],
    ])
    .unwrap()
}

fn cube_options() -> CubeOptions {
    CubeOptions {
        figure: bare_figure(),
        ..CubeOptions::default()
    }
}

fn activity_inputs() -> (ActivityTable, QuantityArray, QuantityArray) {
    let ms = |t: &[f64]| SpikeTrain::new(t.to_vec(), Unit::Millisecond);
    let table = ActivityTable::from_rows(vec![
        vec![ms(&[0.0, 2.0]), ms(&[])],
        vec![ms(&[1.0]), ms(&[3.0])],
    ])
    .unwrap();
    let times = QuantityArray::new(vec![0.0, 1.0, 2.0, 3.0], Unit::Millisecond);
    let positions = QuantityArray::new(vec![-2.0, 2.0], Unit::Degree);
    (table, times, positions)
}

#[test]
fn test_player_loops_in_order() {
    init_logging();
    let animation = animate_cube(
        small_cube().with_dt(Quantity::new(0.5, Unit::Second)),
        &cube_options(),
    )
    .unwrap();

    let mut sink = RecordingSink::default();
    let report = Player::new(&animation).max_loops(2).run(&mut sink).unwrap();

    assert_eq!(
        sink.indices,
        vec![None, Some(0), Some(1), Some(2), Some(0), Some(1), Some(2)]
    );
    assert_eq!(report.frames_presented, 6);
    assert_eq!(report.loops_completed, 2);
    assert!(!report.closed_by_sink);

    assert_eq!(sink.captions[0], "");
    assert_eq!(sink.captions[1], "Time = 0.0 s");
    assert_eq!(sink.captions[3], "Time = 1.0 s");
    assert_eq!(sink.delays[1], Duration::from_millis(50));
    assert_eq!(sink.delays[4], Duration::from_millis(1000));
}

#[test]
fn test_closing_sink_stops_playback() {
    let (table, times, positions) = activity_inputs();
    let options = ActivityOptions {
        figure: bare_figure(),
        ..ActivityOptions::default()
    };
    let animation = animate_spike_activity(&table, &times, &positions, &options).unwrap();

    let mut sink = RecordingSink {
        close_after: Some(3),
        ..RecordingSink::default()
    };
    // Repeating with no loop limit: only the sink can end it
    let report = Player::new(&animation).run(&mut sink).unwrap();

    assert!(report.closed_by_sink);
    assert_eq!(report.frames_presented, 2);
    assert_eq!(sink.captions, vec!["", "Time = 0.0 ms", "Time = 1.0 ms"]);
}

#[test]
fn test_gif_export() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("activity.gif");
    let (table, times, positions) = activity_inputs();
    let options = ActivityOptions {
        figure: bare_figure(),
        export: Some(ExportOptions::new(&path, "pillow")),
        ..ActivityOptions::default()
    };

    animate_spike_activity(&table, &times, &positions, &options).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"GIF8"));
}

#[test]
fn test_frame_sequence_export() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("cube.png");
    let animation = animate_cube(small_cube(), &cube_options()).unwrap();

    let summary = export::save(&animation, &ExportOptions::new(&base, "frames")).unwrap();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.fps, 20.0);
    for index in 0..3 {
        assert!(frame_path(&base, index).exists(), "missing frame {}", index);
    }
    assert!(!frame_path(&base, 3).exists());
}

#[test]
fn test_unknown_writer() {
    let animation = animate_cube(small_cube(), &cube_options()).unwrap();
    let err = export::save(&animation, &ExportOptions::new("anim.avi", "imagemagick")).unwrap_err();
    assert!(matches!(err, VizError::UnknownWriter(_)));
}

#[test]
fn test_missing_ffmpeg_reported() {
    let dir = tempfile::tempdir().unwrap();
    let animation = animate_cube(small_cube(), &cube_options()).unwrap();
    let options = ExportOptions {
        ffmpeg: Some(dir.path().join("no-such-ffmpeg")),
        ..ExportOptions::new(dir.path().join("anim.mp4"), "ffmpeg")
    };
    let err = export::save(&animation, &options).unwrap_err();
    assert!(matches!(err, VizError::EncoderNotFound(_)));
}

#[test]
fn test_ffmpeg_export() {
    init_logging();
    let Some(ffmpeg) = find_ffmpeg(None) else {
        eprintln!("Skipping test: ffmpeg not found");
        return;
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.mp4");
    let options = CubeOptions {
        figure: FigureStyle {
            width: 65,
            height: 49,
            ..bare_figure()
        },
        export: Some(ExportOptions {
            ffmpeg: Some(ffmpeg),
            ..ExportOptions::new(&path, "ffmpeg")
        }),
        ..CubeOptions::default()
    };

    animate_cube(small_cube(), &options).unwrap();
    assert!(Path::new(&path).metadata().unwrap().len() > 0);
}
