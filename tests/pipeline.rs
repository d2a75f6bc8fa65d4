//! End-to-end tests: decode with a scripted rendering engine, group, persist
//! and assemble.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::cell::{Cell, RefCell};
use std::io::{Cursor, Read};
use std::rc::Rc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};

use slidemerge::assembly::Assembler;
use slidemerge::capabilities::Capabilities;
use slidemerge::decode::{DecodeOptions, InputFile, Processor};
use slidemerge::geometry::Size;
use slidemerge::model::{PresentationGroup, Slide};
use slidemerge::progress::{ChannelObserver, ProcessingUpdate, ProgressEvent};
use slidemerge::render::worker::{Backend, DocumentKey, WorkerEngine};
use slidemerge::render::{DocumentPage, RenderEngine, RenderError, RenderedDocument};
use slidemerge::store::Library;
use slidemerge::types::SourceKind;

// ---------------------------------------------------------------------------
// Scripted rendering engine
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum OpenBehavior {
    Succeed,
    Fail,
    Hang,
}

/// Every document it opens has the same scripted pages. `None` pages fail.
struct ScriptedEngine {
    open: OpenBehavior,
    pages: Vec<Option<Size>>,
    live_pages: Rc<Cell<usize>>,
    peak_live_pages: Rc<Cell<usize>>,
    surfaces: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl ScriptedEngine {
    fn new(open: OpenBehavior, pages: Vec<Option<Size>>) -> Self {
        Self {
            open,
            pages,
            live_pages: Rc::new(Cell::new(0)),
            peak_live_pages: Rc::new(Cell::new(0)),
            surfaces: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn uniform(count: usize, size: Size) -> Self {
        Self::new(OpenBehavior::Succeed, vec![Some(size); count])
    }
}

#[async_trait(?Send)]
impl RenderEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open<'a>(&'a self, _bytes: Vec<u8>) -> Result<Box<dyn RenderedDocument + 'a>, RenderError> {
        match self.open {
            OpenBehavior::Succeed => Ok(Box::new(ScriptedDocument { engine: self })),
            OpenBehavior::Fail => Err(RenderError::Open("not a document".into())),
            OpenBehavior::Hang => std::future::pending().await,
        }
    }
}

struct ScriptedDocument<'a> {
    engine: &'a ScriptedEngine,
}

#[async_trait(?Send)]
impl RenderedDocument for ScriptedDocument<'_> {
    fn page_count(&self) -> usize {
        self.engine.pages.len()
    }

    async fn page<'p>(&'p self, index: usize) -> Result<Box<dyn DocumentPage + 'p>, RenderError> {
        let size = self.engine.pages[index].ok_or_else(|| RenderError::page(index, "corrupt page"))?;
        let live = self.engine.live_pages.get() + 1;
        self.engine.live_pages.set(live);
        self.engine.peak_live_pages.set(self.engine.peak_live_pages.get().max(live));
        Ok(Box::new(ScriptedPage { engine: self.engine, size }))
    }
}

struct ScriptedPage<'a> {
    engine: &'a ScriptedEngine,
    size: Size,
}

impl Drop for ScriptedPage<'_> {
    fn drop(&mut self) {
        self.engine.live_pages.set(self.engine.live_pages.get() - 1);
    }
}

#[async_trait(?Send)]
impl DocumentPage for ScriptedPage<'_> {
    fn native_size(&self) -> Size {
        self.size
    }

    async fn render(&self, surface: &mut RgbaImage, _scale: f64) -> Result<(), RenderError> {
        self.engine.surfaces.borrow_mut().push(surface.dimensions());
        surface.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blocking backend on a render thread
// ---------------------------------------------------------------------------

/// Opens every document after sleeping, the way a native parser blocks.
struct BlockingBackend {
    open_delay: Duration,
    pages: usize,
}

impl Backend for BlockingBackend {
    fn open(&mut self, _bytes: Vec<u8>) -> Result<(DocumentKey, usize), RenderError> {
        std::thread::sleep(self.open_delay);
        Ok((1, self.pages))
    }

    fn page_size(&mut self, _document: DocumentKey, _index: usize) -> Result<Size, RenderError> {
        Ok(WIDESCREEN)
    }

    fn render(&mut self, _document: DocumentKey, _index: usize, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        Ok([0, 0, 0, 255].repeat((width * height) as usize))
    }

    fn close(&mut self, _document: DocumentKey) {}
}

fn worker_processor(open_delay: Duration, pages: usize, options: DecodeOptions) -> Processor {
    let engine = WorkerEngine::spawn("blocking", move || Ok(BlockingBackend { open_delay, pages })).unwrap();
    let engine: Rc<dyn RenderEngine> = Rc::new(engine);
    Processor::silent(options, Capabilities::with_renderer(engine))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LETTER_PORTRAIT: Size = Size::new(612.0, 792.0);
const WIDESCREEN: Size = Size::new(960.0, 540.0);

fn options() -> DecodeOptions {
    DecodeOptions { max_pages: 50, open_timeout: Duration::from_secs(5), placeholder_pages: 5 }
}

fn processor(engine: ScriptedEngine, options: DecodeOptions) -> (Processor, tokio::sync::mpsc::UnboundedReceiver<ProcessingUpdate>) {
    let (observer, rx) = ChannelObserver::channel();
    let engine: Rc<dyn RenderEngine> = Rc::new(engine);
    (Processor::new(options, Capabilities::with_renderer(engine), Box::new(observer)), rx)
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProcessingUpdate>) -> Vec<ProcessingUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

fn progress(file_name: &str, page_index: usize, total_pages: usize) -> ProcessingUpdate {
    ProcessingUpdate::Progress(ProgressEvent { file_name: file_name.into(), page_index, total_pages })
}

fn complete(file_name: &str) -> ProcessingUpdate {
    ProcessingUpdate::Complete { file_name: file_name.into() }
}

fn pdf(name: &str) -> InputFile {
    InputFile::from_bytes(name, b"%PDF-1.7".to_vec())
}

fn png(name: &str, width: u32, height: u32) -> InputFile {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    InputFile::from_bytes(name, out.into_inner())
}

fn read_part(bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    Some(text)
}

fn slide_count(bytes: &[u8]) -> usize {
    read_part(bytes, "ppt/presentation.xml").unwrap().matches("<p:sldId ").count()
}

// ---------------------------------------------------------------------------
// Document decoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn renders_every_page_with_progress() {
    let engine = ScriptedEngine::uniform(3, LETTER_PORTRAIT);
    let surfaces = Rc::clone(&engine.surfaces);
    let (processor, mut rx) = processor(engine, options());

    let slides = processor.process_files(&[pdf("deck.pdf")]).await;

    assert_eq!(slides.len(), 3);
    for (i, slide) in slides.iter().enumerate() {
        assert_eq!(slide.page_index, i);
        assert_eq!(slide.kind, SourceKind::PaginatedPage);
        assert_eq!(slide.source_file, "deck.pdf");
        assert!(slide.selected);
        assert!(!slide.is_placeholder());
        assert_eq!(slide.thumbnail.mime, "image/jpeg");

        let dims = slide.dimensions.unwrap();
        assert_eq!((dims.width, dims.height), (612.0, 792.0));
        assert!((dims.scaled_height - 1080.0).abs() < 1e-9);
        assert!((dims.scaled_width - 612.0 * 1080.0 / 792.0).abs() < 1e-9);
    }

    // Thumbnail at 0.2x, then the full render fitted to 1080 pixels high.
    assert_eq!(surfaces.borrow()[..2], [(122, 158), (834, 1080)]);

    assert_eq!(
        drain(&mut rx),
        vec![
            progress("deck.pdf", 0, 3),
            progress("deck.pdf", 1, 3),
            progress("deck.pdf", 2, 3),
            progress("deck.pdf", 3, 3),
            complete("deck.pdf"),
        ]
    );
}

#[tokio::test]
async fn widescreen_pages_render_at_full_canvas() {
    let engine = ScriptedEngine::uniform(1, WIDESCREEN);
    let surfaces = Rc::clone(&engine.surfaces);
    let (processor, _rx) = processor(engine, options());

    let slides = processor.process_files(&[pdf("wide.pdf")]).await;

    assert_eq!(surfaces.borrow()[1], (1920, 1080));
    let full = image::load_from_memory(&slides[0].full_image.as_ref().unwrap().bytes).unwrap();
    assert_eq!((full.width(), full.height()), (1920, 1080));
}

#[tokio::test]
async fn page_count_is_capped() {
    let (processor, mut rx) = processor(ScriptedEngine::uniform(60, WIDESCREEN), options());

    let slides = processor.process_files(&[pdf("long.pdf")]).await;

    assert_eq!(slides.len(), 50);
    assert_eq!(slides.last().unwrap().page_index, 49);
    let updates = drain(&mut rx);
    assert_eq!(updates.first(), Some(&progress("long.pdf", 0, 50)));
    assert_eq!(updates.last(), Some(&complete("long.pdf")));
}

#[tokio::test]
async fn failing_page_becomes_single_placeholder() {
    let engine = ScriptedEngine::new(OpenBehavior::Succeed, vec![Some(WIDESCREEN), None, Some(WIDESCREEN)]);
    let (processor, mut rx) = processor(engine, options());

    let slides = processor.process_files(&[pdf("deck.pdf")]).await;

    assert_eq!(slides.len(), 3);
    assert!(!slides[0].is_placeholder());
    assert!(slides[1].is_placeholder());
    assert_eq!(slides[1].source_file, "deck.pdf (Error on page 2)");
    assert_eq!(slides[1].page_index, 1);
    assert!(slides[1].dimensions.is_none());
    assert!(!slides[2].is_placeholder());

    let completions = drain(&mut rx).into_iter().filter(|u| matches!(u, ProcessingUpdate::Complete { .. })).count();
    assert_eq!(completions, 1);
}

#[tokio::test]
async fn open_failure_yields_placeholders() {
    let engine = ScriptedEngine::new(OpenBehavior::Fail, Vec::new());
    let (processor, mut rx) = processor(engine, options());

    let slides = processor.process_files(&[pdf("broken.pdf")]).await;

    assert_eq!(slides.len(), 5);
    assert!(slides.iter().all(|s| s.is_placeholder() && s.selected && s.dimensions.is_none()));
    assert_eq!(drain(&mut rx), vec![complete("broken.pdf")]);
}

#[tokio::test]
async fn open_timeout_yields_placeholders() {
    let engine = ScriptedEngine::new(OpenBehavior::Hang, Vec::new());
    let options = DecodeOptions { open_timeout: Duration::from_millis(50), placeholder_pages: 2, ..options() };
    let (processor, mut rx) = processor(engine, options);

    let slides = processor.process_files(&[pdf("slow.pdf"), png("after.png", 4, 3)]).await;

    assert_eq!(slides.len(), 3);
    assert!(slides[..2].iter().all(Slide::is_placeholder));
    assert_eq!(slides[2].source_file, "after.png");
    assert_eq!(drain(&mut rx), vec![complete("slow.pdf")]);
}

#[tokio::test]
async fn blocking_open_is_abandoned_at_the_deadline() {
    let options = DecodeOptions { open_timeout: Duration::from_millis(100), ..options() };
    let processor = worker_processor(Duration::from_millis(1500), 1, options);

    let started = Instant::now();
    let slides = processor.process_files(&[pdf("stuck.pdf"), png("after.png", 4, 3)]).await;

    assert!(started.elapsed() < Duration::from_millis(1000));
    assert_eq!(slides.len(), 6);
    assert!(slides[..5].iter().all(Slide::is_placeholder));
    assert_eq!(slides[5].source_file, "after.png");
    assert!(!slides[5].is_placeholder());
}

#[tokio::test]
async fn blocking_backend_renders_pages() {
    let processor = worker_processor(Duration::ZERO, 2, options());

    let slides = processor.process_files(&[pdf("wide.pdf")]).await;

    assert_eq!(slides.len(), 2);
    assert!(slides.iter().all(|s| !s.is_placeholder()));
    let dims = slides[1].dimensions.unwrap();
    assert_eq!((dims.scaled_width, dims.scaled_height), (1920.0, 1080.0));
}

#[tokio::test]
async fn one_page_alive_at_a_time() {
    let engine = ScriptedEngine::uniform(8, LETTER_PORTRAIT);
    let peak = Rc::clone(&engine.peak_live_pages);
    let live = Rc::clone(&engine.live_pages);
    let (processor, _rx) = processor(engine, options());

    processor.process_files(&[pdf("deck.pdf")]).await;

    assert_eq!(peak.get(), 1);
    assert_eq!(live.get(), 0);
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn groups_follow_input_order_and_skip_empty_files() {
    let (processor, _rx) = processor(ScriptedEngine::uniform(2, WIDESCREEN), options());

    let groups = processor
        .process_files_as_groups(&[
            pdf("a.pdf"),
            InputFile::from_bytes("notes.txt", b"hello".to_vec()),
            png("b.png", 40, 30),
            InputFile::from_bytes("old.pptx", vec![0; 8]),
        ])
        .await;

    let names: Vec<_> = groups.iter().map(|g| g.source_file_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.png"]);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0].kind, SourceKind::PaginatedPage);
    assert_eq!(groups[0].thumbnail, groups[0].slides[0].thumbnail);
    assert_eq!(groups[1].kind, SourceKind::RasterImage);
    assert!(groups.iter().all(|g| g.selected && !g.is_empty()));
}

#[tokio::test]
async fn files_are_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.png");
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(8, 6, Rgba([0, 0, 255, 255])).write_to(&mut out, ImageFormat::Png).unwrap();
    std::fs::write(&path, out.get_ref()).unwrap();

    let processor = Processor::silent(options(), Capabilities::without_renderer("test"));
    let slides = processor
        .process_files(&[InputFile::from_path(&path), InputFile::from_path(dir.path().join("missing.png"))])
        .await;

    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].source_file, "photo.png");
    assert_eq!(slides[0].full_image.as_ref().unwrap().bytes, out.into_inner());
    assert!(slides[1].is_placeholder());
    let dims = slides[1].dimensions.unwrap();
    assert_eq!((dims.width, dims.height), (800.0, 600.0));
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

async fn sample_groups() -> Vec<PresentationGroup> {
    let engine = ScriptedEngine::new(OpenBehavior::Succeed, vec![Some(LETTER_PORTRAIT), None]);
    let (processor, _rx) = processor(engine, options());
    processor.process_files_as_groups(&[pdf("deck.pdf"), png("cat.png", 30, 40)]).await
}

#[tokio::test]
async fn merged_groups_become_one_deck() {
    let groups = sample_groups().await;
    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_presentations(&groups);

    assert!(!artifact.is_empty());
    assert_eq!(artifact.mime, "application/vnd.openxmlformats-officedocument.presentationml.presentation");
    assert_eq!(slide_count(&artifact.bytes), 3);

    let page = read_part(&artifact.bytes, "ppt/slides/slide1.xml").unwrap();
    assert!(page.contains("<p:pic>"));

    let failed = read_part(&artifact.bytes, "ppt/slides/slide2.xml").unwrap();
    assert!(failed.contains("could not be loaded"));
    assert!(!failed.contains("<p:pic>"));

    let notes = read_part(&artifact.bytes, "ppt/notesSlides/notesSlide1.xml").unwrap();
    assert!(notes.contains("Source: deck.pdf (Page 1)"));
    let image_notes = read_part(&artifact.bytes, "ppt/notesSlides/notesSlide3.xml").unwrap();
    assert!(image_notes.contains("Source: cat.png"));
    assert!(!image_notes.contains("(Page"));
}

#[tokio::test]
async fn deselected_groups_are_left_out() {
    let mut groups = sample_groups().await;
    groups[0].selected = false;
    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_presentations(&groups);
    assert_eq!(slide_count(&artifact.bytes), 1);
}

#[test]
fn empty_selection_is_a_valid_empty_deck() {
    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_slides(&[]);
    assert!(!artifact.is_empty());
    assert_eq!(slide_count(&artifact.bytes), 0);
    assert!(read_part(&artifact.bytes, "ppt/slides/slide1.xml").is_none());
}

#[test]
fn placeholder_only_deck_is_all_captions() {
    let slides: Vec<_> = (0..4).map(|i| Slide::placeholder("broken.pdf", SourceKind::PaginatedPage, i)).collect();
    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_slides(&slides);

    assert_eq!(slide_count(&artifact.bytes), 4);
    for n in 1..=4 {
        let page = read_part(&artifact.bytes, &format!("ppt/slides/slide{n}.xml")).unwrap();
        assert!(page.contains("Content from &quot;broken.pdf&quot; could not be loaded"));
        assert!(!page.contains("<p:pic>"));
    }
    assert!(read_part(&artifact.bytes, "ppt/media/image1.png").is_none());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

fn group_names(groups: &[PresentationGroup]) -> Vec<&str> {
    groups.iter().map(|g| g.source_file_name.as_str()).collect()
}

#[tokio::test]
async fn library_round_trips_groups_and_selection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.redb");
    let groups = sample_groups().await;

    {
        let library = Library::open(&path).unwrap();
        library.save_groups(&groups).unwrap();
        assert!(library.set_group_selected(&groups[1].id, false).unwrap());
    }

    let library = Library::open(&path).unwrap();
    let stored = library.get_groups().unwrap();
    assert_eq!(group_names(&stored), vec!["deck.pdf", "cat.png"]);

    let deck = &stored[0];
    assert_eq!(deck.id, groups[0].id);
    let ids: Vec<_> = deck.slides.iter().map(|s| &s.id).collect();
    assert_eq!(ids, groups[0].slides.iter().map(|s| &s.id).collect::<Vec<_>>());
    assert_eq!(deck.slides[0].full_image, groups[0].slides[0].full_image);
    assert!(deck.slides[1].is_placeholder());
    assert!(deck.selected);
    assert!(!stored[1].selected);

    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_presentations(&stored);
    assert_eq!(slide_count(&artifact.bytes), 2);

    library.clear_all().unwrap();
    assert!(library.get_groups().unwrap().is_empty());
}

#[tokio::test]
async fn exported_groups_follow_import_order() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(&dir.path().join("library.redb")).unwrap();
    let processor = Processor::silent(options(), Capabilities::without_renderer("test"));
    let names: Vec<_> = (0..8).map(|i| format!("f{i}.png")).collect();
    let files: Vec<_> = names.iter().map(|name| png(name, 4, 3)).collect();

    let groups = processor.process_files_as_groups(&files).await;
    library.replace_groups(&groups).unwrap();

    let stored = library.get_groups().unwrap();
    assert_eq!(group_names(&stored), names);

    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_presentations(&stored);
    for (n, name) in names.iter().enumerate() {
        let notes = read_part(&artifact.bytes, &format!("ppt/notesSlides/notesSlide{}.xml", n + 1)).unwrap();
        assert!(notes.contains(&format!("Source: {name}")));
    }
}

#[tokio::test]
async fn reimported_files_replace_their_groups() {
    let dir = tempfile::tempdir().unwrap();
    let library = Library::open(&dir.path().join("library.redb")).unwrap();
    let processor = Processor::silent(options(), Capabilities::without_renderer("test"));

    let first = processor.process_files_as_groups(&[png("a.png", 4, 3), png("b.png", 4, 3)]).await;
    assert_eq!(library.replace_groups(&first).unwrap(), 0);
    let again = processor.process_files_as_groups(&[png("b.png", 4, 3)]).await;
    assert_eq!(library.replace_groups(&again).unwrap(), 1);

    let stored = library.get_groups().unwrap();
    assert_eq!(group_names(&stored), vec!["a.png", "b.png"]);
    assert_eq!(stored[1].id, again[0].id);

    let artifact = Assembler::new(Capabilities::without_renderer("test")).merge_presentations(&stored);
    assert_eq!(slide_count(&artifact.bytes), 2);
}
