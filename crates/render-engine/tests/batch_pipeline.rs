use std::cell::RefCell;
use std::path::{Path, PathBuf};

use shortsmith_common::error::{ShortsmithError, ShortsmithResult};
use shortsmith_plan_model::naming::MANIFEST_FILE_NAME;
use shortsmith_plan_model::plan::Plan;
use shortsmith_plan_model::record::read_manifest;
use shortsmith_plan_model::target::{Color, Geometry, RenderTarget};
use shortsmith_text_layout::font::FontSet;
use shortsmith_render_engine::{
    prepare_output_dir, BatchEvent, BatchOrchestrator, ClipStage, MediaKind, MediaSource,
    RenderBackend, RenderContext, RenderInvocation, CAPTION_FILE_NAME,
};

/// Writes placeholder outputs instead of encoding, failing any output whose
/// file name contains `fail_on`.
#[derive(Default)]
struct FakeBackend {
    fail_on: Option<&'static str>,
    invocations: RefCell<Vec<Vec<String>>>,
    captions_present: RefCell<Vec<bool>>,
}

impl RenderBackend for FakeBackend {
    fn render(&self, invocation: &RenderInvocation, workdir: &Path) -> ShortsmithResult<()> {
        self.invocations
            .borrow_mut()
            .push(invocation.to_ffmpeg_args());
        self.captions_present
            .borrow_mut()
            .push(workdir.join(CAPTION_FILE_NAME).is_file());

        std::fs::write(&invocation.output, b"partial mp4")?;
        let name = invocation.output.to_string_lossy();
        if self.fail_on.is_some_and(|needle| name.contains(needle)) {
            return Err(ShortsmithError::render("ffmpeg exited with status 1"));
        }
        Ok(())
    }

    fn extract_frame(&self, _video: &Path, _at_secs: f64, output: &Path) -> ShortsmithResult<()> {
        std::fs::write(output, b"jpeg")?;
        Ok(())
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    output_dir: PathBuf,
    source: MediaSource,
    target: RenderTarget,
}

fn fixture(kind: MediaKind) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("input.mp4");
    std::fs::write(&input, b"not really media").expect("write input");
    let output_dir = prepare_output_dir(&dir.path().join("out")).expect("output dir");

    Fixture {
        output_dir,
        source: MediaSource {
            path: input,
            kind,
            has_audio: true,
        },
        target: RenderTarget {
            geometry: Geometry::new(1080, 1920),
            margin: 40,
            max_lines: 2,
            background: Color::rgb(0x10, 0x11, 0x14),
        },
        _dir: dir,
    }
}

fn video() -> MediaKind {
    MediaKind::Video {
        width: 1920,
        height: 1080,
    }
}

impl Fixture {
    fn context(&self, burn_captions: bool) -> RenderContext<'_> {
        RenderContext {
            source: &self.source,
            target: &self.target,
            fonts: None,
            output_dir: &self.output_dir,
            burn_captions,
        }
    }

    fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output_dir)
            .expect("read output dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

const SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n";

/// A real TrueType font for both directions, if the machine has one.
fn system_fonts() -> Option<FontSet> {
    let path = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:/Windows/Fonts/arial.ttf",
    ]
    .iter()
    .map(Path::new)
    .find(|path| path.is_file())?;
    FontSet::load(path, path).ok()
}

fn plan(json: &str) -> Plan {
    Plan::from_json_str(json).expect("plan should parse")
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

#[test]
fn single_video_clip_produces_all_outputs_and_manifest() {
    let fx = fixture(video());
    let backend = FakeBackend::default();
    let plan = plan(&format!(
        r#"{{"shorts":[{{"id":"s1","title":"Hello World","start_sec":10,"end_sec":16,
            "language":"en","direction":"ltr","category":"demo","keywords":["a","b"],
            "srt":{}}}]}}"#,
        serde_json::to_string(SRT).unwrap()
    ));

    let report = BatchOrchestrator::new(fx.context(false), &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert_eq!(report.records.len(), 1);
    assert!(report.skipped.is_empty() && report.failed.is_empty());
    assert_eq!(
        fx.output_files(),
        vec![
            MANIFEST_FILE_NAME.to_string(),
            "s1__hello-world.mp4".to_string(),
            "s1__hello-world.srt".to_string(),
            "s1__thumb.jpg".to_string(),
        ]
    );

    // Without fonts the captions are written as given.
    let srt = std::fs::read_to_string(fx.output_dir.join("s1__hello-world.srt")).unwrap();
    assert_eq!(srt, SRT);

    let invocations = backend.invocations.borrow();
    assert_eq!(invocations.len(), 1);
    assert_eq!(flag_value(&invocations[0], "-t"), Some("6"));
    assert_eq!(flag_value(&invocations[0], "-ss"), Some("10"));
    assert!(!invocations[0].iter().any(|a| a.contains("subtitles")));

    let rows = read_manifest(report.manifest.as_deref().unwrap()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "s1");
    assert_eq!(rows[0].duration_sec, 6.0);
    assert_eq!(rows[0].keywords, "a,b");
    assert_eq!(rows[0].srt_path, "s1__hello-world.srt");
    assert_eq!(rows[0].thumb_path, "s1__thumb.jpg");
}

#[test]
fn out_of_range_clip_is_skipped_and_others_render() {
    let fx = fixture(video());
    let backend = FakeBackend::default();
    let plan = plan(
        r#"{"shorts":[
            {"id":"s2","title":"Too short","start_sec":0,"end_sec":3},
            {"id":"s3","title":"Fine","start_sec":20,"end_sec":30}
        ]}"#,
    );

    let mut events = Vec::new();
    let report = BatchOrchestrator::new(fx.context(false), &backend)
        .run(&plan, |event| {
            if let BatchEvent::ClipFinished { clip, outcome, .. } = event {
                events.push((clip.id.clone(), outcome.is_rendered()));
            }
        })
        .expect("batch should finish");

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, "s2");
    assert!(report.skipped[0].reason.contains("outside 5-60s"));
    assert_eq!(events, vec![("s2".to_string(), false), ("s3".to_string(), true)]);
    assert_eq!(backend.invocations.borrow().len(), 1);

    let rows = read_manifest(&fx.output_dir.join(MANIFEST_FILE_NAME)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "s3");
    assert_eq!(rows[0].srt_path, "");
    assert!(!fx.output_files().iter().any(|name| name.starts_with("s2__")));
}

#[test]
fn failed_clip_leaves_no_partial_outputs() {
    let fx = fixture(video());
    let backend = FakeBackend {
        fail_on: Some("broken"),
        ..Default::default()
    };
    let plan = plan(&format!(
        r#"{{"shorts":[
            {{"id":"s1","title":"Broken one","start_sec":0,"end_sec":10,"srt":{srt}}},
            {{"id":"s2","title":"Works","start_sec":10,"end_sec":20}}
        ]}}"#,
        srt = serde_json::to_string(SRT).unwrap()
    ));

    let report = BatchOrchestrator::new(fx.context(false), &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "s1");
    assert_eq!(report.failed[0].stage, ClipStage::Rendering);
    assert!(report.failed[0].message.contains("status 1"));
    assert_eq!(report.records.len(), 1);
    assert_eq!(
        fx.output_files(),
        vec![
            MANIFEST_FILE_NAME.to_string(),
            "s2__thumb.jpg".to_string(),
            "s2__works.mp4".to_string(),
        ]
    );
}

#[test]
fn no_manifest_when_nothing_succeeds() {
    let fx = fixture(video());
    let backend = FakeBackend {
        fail_on: Some(".mp4"),
        ..Default::default()
    };
    let plan = plan(
        r#"{"shorts":[
            {"id":"a","title":"One","start_sec":0,"end_sec":10},
            {"id":"b","title":"Two","start_sec":0,"end_sec":2}
        ]}"#,
    );

    let report = BatchOrchestrator::new(fx.context(false), &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert!(report.manifest.is_none());
    assert_eq!(report.attempted(), 2);
    assert!(fx.output_files().is_empty());
}

#[test]
fn burned_captions_are_staged_in_the_working_directory() {
    let fx = fixture(video());
    let backend = FakeBackend::default();
    let plan = plan(&format!(
        r#"{{"shorts":[{{"id":"c1","title":"Captioned","start_sec":0,"end_sec":8,"srt":{}}}]}}"#,
        serde_json::to_string(SRT).unwrap()
    ));

    BatchOrchestrator::new(fx.context(true), &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert_eq!(*backend.captions_present.borrow(), vec![true]);
    let graph = flag_value(&backend.invocations.borrow()[0], "-filter_complex")
        .unwrap()
        .to_string();
    assert!(graph.contains("subtitles=filename=captions.srt"));
}

#[test]
fn audio_source_without_fonts_fails_at_thumbnail_stage() {
    let fx = fixture(MediaKind::Audio);
    let backend = FakeBackend::default();
    let plan = plan(r#"{"shorts":[{"id":"p1","title":"Podcast","start_sec":0,"end_sec":30}]}"#);

    let report = BatchOrchestrator::new(fx.context(false), &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].stage, ClipStage::Thumbnail);
    assert!(backend.invocations.borrow().is_empty());
    assert!(fx.output_files().is_empty());
}

#[test]
fn audio_source_renders_title_card_with_waveform() {
    let Some(fonts) = system_fonts() else {
        return;
    };
    let fx = fixture(MediaKind::Audio);
    let backend = FakeBackend::default();
    let plan = plan(&format!(
        r#"{{"shorts":[{{"id":"s1","title":"Hello World","start_sec":10,"end_sec":16,
            "direction":"ltr","srt":{}}}]}}"#,
        serde_json::to_string(SRT).unwrap()
    ));
    let ctx = RenderContext {
        fonts: Some(&fonts),
        ..fx.context(true)
    };

    let report = BatchOrchestrator::new(ctx, &backend)
        .run(&plan, |_| {})
        .expect("batch should finish");

    assert_eq!(report.records.len(), 1);
    assert!(report.failed.is_empty());
    assert_eq!(
        fx.output_files(),
        vec![
            MANIFEST_FILE_NAME.to_string(),
            "s1__hello-world.mp4".to_string(),
            "s1__hello-world.srt".to_string(),
            "s1__thumb.jpg".to_string(),
        ]
    );

    let invocations = backend.invocations.borrow();
    let args = &invocations[0];
    assert_eq!(flag_value(args, "-t"), Some("6"));
    assert!(flag_value(args, "-ss").is_none());
    assert!(flag_value(args, "-i").is_some_and(|still| still.ends_with("still.jpg")));

    let graph = flag_value(args, "-filter_complex").unwrap();
    assert!(graph.contains("atrim=start=10:end=16"));
    assert!(graph.contains("showwaves="));
    let family = fonts.for_direction(plan.shorts[0].direction).family();
    assert!(graph.contains(&format!("FontName={family}")));
    assert!(graph.contains(":fontsdir="));
    assert_eq!(*backend.captions_present.borrow(), vec![true]);

    let thumb = std::fs::read(fx.output_dir.join("s1__thumb.jpg")).unwrap();
    assert_eq!(&thumb[..2], &[0xFF, 0xD8]);

    let rows = read_manifest(report.manifest.as_deref().unwrap()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].duration_sec, 6.0);
}
