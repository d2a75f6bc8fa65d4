//! Runs a blocking rendering backend on its own thread.
//!
//! Native renderers parse and draw synchronously and their handles are not
//! `Send`. A [`Backend`] is therefore created on a dedicated thread and
//! driven through a command queue; every call from the async side awaits a
//! oneshot reply, so a slow parse never stalls the executor and the
//! decoder's open deadline can fire.
//!
//! Commands are served one at a time. After an abandoned open, later commands
//! queue behind it until the backend returns.

use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::oneshot;
use tracing::debug;

use super::{DocumentPage, RenderEngine, RenderError, RenderedDocument};
use crate::geometry::Size;

/// Backend handle of an opened document.
pub type DocumentKey = u64;

/// A synchronous renderer owned by the worker thread.
pub trait Backend {
    /// Parse a document, returning its key and page count.
    fn open(&mut self, bytes: Vec<u8>) -> Result<(DocumentKey, usize), RenderError>;

    /// Size of one page at scale 1.0.
    fn page_size(&mut self, document: DocumentKey, index: usize) -> Result<Size, RenderError>;

    /// Draw one page into a `width` x `height` RGBA buffer.
    fn render(&mut self, document: DocumentKey, index: usize, width: u32, height: u32) -> Result<Vec<u8>, RenderError>;

    /// Release a document.
    fn close(&mut self, document: DocumentKey);
}

type Reply<T> = oneshot::Sender<Result<T, RenderError>>;

enum Command {
    Open { bytes: Vec<u8>, reply: Reply<(DocumentKey, usize)> },
    PageSize { document: DocumentKey, index: usize, reply: Reply<Size> },
    Render { document: DocumentKey, index: usize, width: u32, height: u32, reply: Reply<Vec<u8>> },
    Close { document: DocumentKey },
}

/// [`RenderEngine`] that forwards every operation to a backend thread.
#[derive(Debug)]
pub struct WorkerEngine {
    name: String,
    commands: mpsc::Sender<Command>,
}

impl WorkerEngine {
    /// Start the worker thread and build the backend on it with `make`.
    /// Fails if the backend cannot be created.
    pub fn spawn<B, F>(name: impl Into<String>, make: F) -> Result<Self, RenderError>
    where
        B: Backend + 'static,
        F: FnOnce() -> Result<B, RenderError> + Send + 'static,
    {
        let name = name.into();
        let (commands, queue) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name(format!("{name}-render"))
            .spawn(move || {
                let backend = match make() {
                    Ok(backend) => backend,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                serve(backend, &queue);
            })
            .map_err(|e| RenderError::Unavailable(format!("failed to start render thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| RenderError::Unavailable("render thread exited during startup".into()))??;

        Ok(Self { name, commands })
    }
}

fn serve<B: Backend>(mut backend: B, queue: &mpsc::Receiver<Command>) {
    while let Ok(command) = queue.recv() {
        match command {
            Command::Open { bytes, reply } => {
                // The caller gave up waiting; nobody will close this document.
                if let Err(Ok((document, _))) = reply.send(backend.open(bytes)) {
                    debug!("Closing abandoned document {document}");
                    backend.close(document);
                }
            }
            Command::PageSize { document, index, reply } => {
                let _ = reply.send(backend.page_size(document, index));
            }
            Command::Render { document, index, width, height, reply } => {
                let _ = reply.send(backend.render(document, index, width, height));
            }
            Command::Close { document } => backend.close(document),
        }
    }
    debug!("Render thread stopped");
}

fn stopped() -> RenderError {
    RenderError::Unavailable("render thread stopped".into())
}

async fn request<T>(
    commands: &mpsc::Sender<Command>,
    command: impl FnOnce(Reply<T>) -> Command,
) -> Result<T, RenderError> {
    let (reply, response) = oneshot::channel();
    commands.send(command(reply)).map_err(|_| stopped())?;
    response.await.map_err(|_| stopped())?
}

#[async_trait(?Send)]
impl RenderEngine for WorkerEngine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn RenderedDocument + 'a>, RenderError> {
        let (key, pages) = request(&self.commands, |reply| Command::Open { bytes, reply }).await?;
        Ok(Box::new(WorkerDocument { commands: self.commands.clone(), key, pages }))
    }
}

struct WorkerDocument {
    commands: mpsc::Sender<Command>,
    key: DocumentKey,
    pages: usize,
}

impl Drop for WorkerDocument {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Close { document: self.key });
    }
}

#[async_trait(?Send)]
impl RenderedDocument for WorkerDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    async fn page<'p>(&'p self, index: usize) -> Result<Box<dyn DocumentPage + 'p>, RenderError> {
        let native = request(&self.commands, |reply| Command::PageSize { document: self.key, index, reply }).await?;
        Ok(Box::new(WorkerPage { document: self, index, native }))
    }
}

struct WorkerPage<'a> {
    document: &'a WorkerDocument,
    index: usize,
    native: Size,
}

#[async_trait(?Send)]
impl DocumentPage for WorkerPage<'_> {
    fn native_size(&self) -> Size {
        self.native
    }

    async fn render(&self, surface: &mut RgbaImage, _scale: f64) -> Result<(), RenderError> {
        let (width, height) = surface.dimensions();
        let (document, index) = (self.document.key, self.index);
        let pixels = request(&self.document.commands, |reply| Command::Render {
            document,
            index,
            width,
            height,
            reply,
        })
        .await?;

        let drawn = RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::page(index, "bitmap size does not match the surface"))?;
        image::imageops::overlay(surface, &drawn, 0, 0);
        Ok(())
    }
}
