//! Conversion modes
//!
//! Each mode has a blocking `*_sync` entry point and an async wrapper that
//! runs it on tokio's blocking pool. Per-page work fans out over rayon when
//! the renderer allows it; results are always collected in page order.

mod booklet;
mod compress;
mod io;
mod split;

pub use booklet::{booklet, booklet_sync};
pub use compress::{compress, compress_sync};
pub use io::{read_pdf, write_pdf};
pub use split::{split, split_sync};

use crate::options::RasterOptions;
use crate::raster::{CompressedImage, PageRenderer, recompress};
use crate::source::SourcePage;
use crate::types::*;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation switch for one conversion
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Output of a conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<S> {
    pub pdf: Vec<u8>,
    pub stats: S,
}

/// Run `f` for every page index, checking for cancellation before each one
pub(crate) fn map_pages<T, F>(
    count: usize,
    parallel: bool,
    cancel: &CancelFlag,
    f: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Send + Sync,
{
    let run = |index: usize| {
        cancel.check()?;
        f(index)
    };
    if parallel {
        (0..count).into_par_iter().map(run).collect()
    } else {
        (0..count).map(run).collect()
    }
}

/// Render a page and recompress it
pub(crate) fn render_compressed(
    renderer: &dyn PageRenderer,
    page: &SourcePage<'_>,
    options: &RasterOptions,
) -> Result<CompressedImage> {
    let raster = renderer.render(page, options.render_scale)?;
    let image = recompress(raster, options.quality, options.max_dimension)?;
    log::debug!(
        "page {}: {}x{} JPEG, {} bytes",
        page.index(),
        image.width,
        image.height,
        image.byte_size()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_pages_keeps_order() {
        let cancel = CancelFlag::new();
        let out = map_pages(100, true, &cancel, |i| Ok(i * 2)).unwrap();
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_map_pages_stops_when_cancelled() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = map_pages(3, false, &cancel, Ok);
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[test]
    fn test_map_pages_propagates_errors() {
        let cancel = CancelFlag::new();
        let result: Result<Vec<usize>> = map_pages(5, true, &cancel, |i| {
            if i == 3 {
                Err(PipelineError::raster(i, "boom"))
            } else {
                Ok(i)
            }
        });
        assert!(matches!(
            result,
            Err(PipelineError::Rasterization { page_index: 3, .. })
        ));
    }
}
