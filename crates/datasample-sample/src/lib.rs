//! Sampling front-end for datasample.
//!
//! [`DataSample`] is the command behind "copy a sample of the source store
//! into the destination": it resolves app and model labels against a
//! [`Registry`], asks for confirmation, picks up to `limit` keys of every
//! model and hands the selection to the
//! [`Importer`](datasample_importer::Importer).
//!
//! Argument parsing is left to the caller; options arrive as a
//! [`SampleOptions`] value, which can also be read from JSON.

pub mod collect;
pub mod options;
pub mod prompt;

pub use collect::{collect_keys, collect_models};
pub use options::SampleOptions;
pub use prompt::{confirm, confirmation_prompt, format_connection};

use std::io::{BufRead, Write};

use rand::Rng;

use datasample_core::{Connection, Registry, Result, ValidationError, ValidationErrorKind};
use datasample_importer::{CancelFlag, ImportConfig, ImportReport, Importer};

/// How a [`DataSample`] run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleOutcome {
    /// The sample was copied.
    Imported(ImportReport),
    /// The user did not confirm; nothing was read or written.
    Declined,
}

/// The sampling command.
pub struct DataSample<'r, S, D> {
    importer: Importer<S, D, &'r Registry>,
    registry: &'r Registry,
    options: SampleOptions,
}

impl<'r, S, D> DataSample<'r, S, D>
where
    S: Connection,
    D: Connection,
{
    /// Prepare a run, rejecting bad options before touching either store.
    ///
    /// Fails when the batch size is not positive or when `source` and
    /// `destination` name the same store.
    pub fn new(
        source: S,
        destination: D,
        registry: &'r Registry,
        options: SampleOptions,
    ) -> Result<Self> {
        let batch_size = options.validate()?;
        if source.name() == destination.name() {
            return Err(ValidationError::new(
                ValidationErrorKind::SameStore,
                "source and destination must be different stores",
            )
            .into());
        }
        let importer = Importer::new(source, destination, registry)
            .with_config(ImportConfig::new().batch_size(batch_size));
        Ok(Self {
            importer,
            registry,
            options,
        })
    }

    /// Share a cancellation flag with the caller.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.importer = self.importer.with_cancel_flag(cancel);
        self
    }

    /// Get the options.
    pub fn options(&self) -> &SampleOptions {
        &self.options
    }

    /// Get the underlying importer.
    pub fn importer(&self) -> &Importer<S, D, &'r Registry> {
        &self.importer
    }

    /// Take back the connections.
    pub fn into_connections(self) -> (S, D) {
        let (source, destination, _) = self.importer.into_parts();
        (source, destination)
    }

    /// Run the command.
    ///
    /// When interactive, the confirmation prompt is written to `output` and
    /// the answer read from `input`; anything but `yes` declines and prints
    /// `Data import cancelled.`. Random sampling draws from `rng`.
    pub fn run<R, W, G>(
        &mut self,
        input: &mut R,
        output: &mut W,
        rng: &mut G,
    ) -> Result<SampleOutcome>
    where
        R: BufRead + ?Sized,
        W: Write + ?Sized,
        G: Rng + ?Sized,
    {
        let models = collect_models(
            self.registry,
            self.options.labels.as_slice(),
            self.options.exclude.as_slice(),
        )?;

        if self.options.interactive {
            let prompt = confirmation_prompt(
                self.importer.source(),
                self.importer.destination(),
                &models,
            );
            if !confirm(input, output, &prompt)? {
                writeln!(output, "Data import cancelled.")?;
                tracing::info!("Data import declined");
                return Ok(SampleOutcome::Declined);
            }
        }

        let selection = collect_keys(
            self.importer.source(),
            &models,
            self.options.key_limit(),
            self.options.random,
            rng,
        )?;
        let report = self.importer.import(selection)?;
        Ok(SampleOutcome::Imported(report))
    }
}

impl<S, D> std::fmt::Debug for DataSample<'_, S, D>
where
    S: Connection,
    D: Connection,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSample")
            .field("importer", &self.importer)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
