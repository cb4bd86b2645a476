//! Training driver: runs every pass over every image pair.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::cascade::Cascade;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pgm::read_gray_file;
use crate::GrayImage;

/// One training example: a noisy capture and an independent capture of the
/// same scene whose context drives the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingPair {
    pub input: PathBuf,
    pub reference: PathBuf,
}

/// Groups a flat list `[input0, reference0, input1, reference1, ...]`.
pub fn pairs_from_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<TrainingPair>> {
    if names.len() % 2 != 0 {
        return Err(Error::OddFileCount { count: names.len() });
    }
    Ok(names
        .chunks_exact(2)
        .map(|pair| TrainingPair {
            input: PathBuf::from(pair[0].as_ref()),
            reference: PathBuf::from(pair[1].as_ref()),
        })
        .collect())
}

/// Indexed collection of `(input, reference)` images.
pub trait PairSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short description for progress output.
    fn label(&self, index: usize) -> String;

    /// Both images of pair `index`, fully loaded.
    fn load(&self, index: usize) -> Result<(Cow<'_, GrayImage>, Cow<'_, GrayImage>)>;
}

impl PairSource for [TrainingPair] {
    fn len(&self) -> usize {
        <[TrainingPair]>::len(self)
    }

    fn label(&self, index: usize) -> String {
        format!("{} {}", self[index].input.display(), self[index].reference.display())
    }

    fn load(&self, index: usize) -> Result<(Cow<'_, GrayImage>, Cow<'_, GrayImage>)> {
        let pair = &self[index];
        let input = read_gray_file(&pair.input)?;
        let reference = read_gray_file(&pair.reference)?;
        Ok((Cow::Owned(input), Cow::Owned(reference)))
    }
}

impl PairSource for [(GrayImage, GrayImage)] {
    fn len(&self) -> usize {
        <[(GrayImage, GrayImage)]>::len(self)
    }

    fn label(&self, index: usize) -> String {
        format!("pair #{index}")
    }

    fn load(&self, index: usize) -> Result<(Cow<'_, GrayImage>, Cow<'_, GrayImage>)> {
        let (input, reference) = &self[index];
        Ok((Cow::Borrowed(input), Cow::Borrowed(reference)))
    }
}

/// Progress of a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingProgress {
    /// Current pass (0-based).
    pub pass: usize,
    pub passes: usize,
    /// Pairs finished in this pass.
    pub completed: usize,
    pub total: usize,
}

/// Callback type for progress reporting. Invoked from worker threads.
pub type ProgressCallback = Arc<dyn Fn(TrainingProgress) + Send + Sync>;

/// Cooperative stop request shared between a trainer and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Builds a cascade from image pairs.
///
/// Passes run strictly in sequence. Within a pass pairs are spread over the
/// rayon pool and accumulate into the same table concurrently. The first
/// failing pair aborts the whole run.
pub struct Trainer {
    config: Config,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
}

impl Trainer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancelToken::default(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Pairs not yet started when `cancel` fires are skipped and the run
    /// ends with [`Error::Cancelled`] once the current pass drains. A cancel
    /// arriving after the last pair has started changes nothing.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn train<S: PairSource + ?Sized>(&self, pairs: &S) -> Result<Cascade> {
        self.config.validate()?;
        match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Config(format!("failed to build thread pool: {e}")))?;
                pool.install(|| self.run(pairs))
            }
            None => self.run(pairs),
        }
    }

    fn run<S: PairSource + ?Sized>(&self, pairs: &S) -> Result<Cascade> {
        let passes = self.config.passes;
        let total = pairs.len();
        tracing::info!(pairs = total, passes, "Starting training");

        let cascade = Cascade::new(passes).with_mirror_augment(self.config.mirror_augment);

        for pass in 0..passes {
            let skipped = self.run_pass(&cascade, pass, pairs)?;
            if skipped > 0 {
                tracing::warn!(pass = pass + 1, passes, skipped, "Training cancelled");
                return Err(Error::Cancelled { pass });
            }
        }

        tracing::info!(passes, "Training finished");
        Ok(cascade)
    }

    /// Trains one pass; returns how many pairs were skipped by cancellation.
    fn run_pass<S: PairSource + ?Sized>(
        &self,
        cascade: &Cascade,
        pass: usize,
        pairs: &S,
    ) -> Result<usize> {
        let passes = cascade.passes();
        let total = pairs.len();
        let remaining = Mutex::new(total);
        let completed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);

        (0..total).into_par_iter().try_for_each(|index| -> Result<()> {
            if self.cancel.is_cancelled() {
                skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }

            {
                let mut left = remaining.lock();
                tracing::info!(
                    pass = pass + 1,
                    passes,
                    remaining = *left,
                    pair = %pairs.label(index),
                    "Processing"
                );
                *left -= 1;
            }

            let (input, reference) = pairs.load(index)?;
            cascade.train_pass(pass, &input, &reference)?;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = &self.progress {
                progress(TrainingProgress {
                    pass,
                    passes,
                    completed: done,
                    total,
                });
            }
            Ok(())
        })?;
        Ok(skipped.into_inner())
    }
}

/// Trains on the pairs named by a flat file list.
pub fn train_from_list<S: AsRef<str>>(names: &[S], config: Config) -> Result<Cascade> {
    let pairs = pairs_from_list(names)?;
    tracing::info!(files = names.len(), "Files to process");
    Trainer::new(config).train(pairs.as_slice())
}
