//! Running a merge: copy or transform every delivery into the writer and
//! commit the output.

use std::io::{Read, Seek, Write};

use crate::read::Archive;
use crate::record::EntryRecord;
use crate::transform::TransformerRegistry;
use crate::write::{EntrySink, Writer};
use crate::Result;

use super::commit::{StagedFile, Target};
use super::plan::{Delivery, Flow, Origin, PlanStats, traverse};
use super::MergeConfig;

/// Statistics of a merge run.
#[must_use = "merge results should be checked to see whether the run was stopped"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeResult {
    /// Entries in the output archive, including every entry a transformer
    /// emitted.
    pub entries_written: usize,
    /// Added entries copied into the output.
    pub entries_added: usize,
    /// Existing entries copied into the output.
    pub entries_copied: usize,
    /// Entries handed to a transformer.
    pub entries_transformed: usize,
    /// Existing entries dropped by removal.
    pub entries_removed: usize,
    /// Entries the name mapper excluded.
    pub entries_excluded: usize,
    /// Entries skipped because an earlier one had the same output name.
    pub entries_shadowed: usize,
    /// The observer stopped the run. In place, nothing was written and the
    /// written, added, copied and transformed counts are zero.
    pub stopped: bool,
    /// Size of the output archive in bytes.
    pub bytes_written: u64,
}

impl MergeResult {
    fn record_plan(&mut self, plan: PlanStats) {
        self.entries_removed = plan.removed;
        self.entries_excluded = plan.excluded;
        self.entries_shadowed = plan.shadowed;
        self.stopped = plan.stopped;
    }
}

/// Per-run state of the copying visitor.
struct Copier<'w, W: Write> {
    writer: &'w mut Writer<W>,
    transformers: TransformerRegistry,
    preserve_timestamps: bool,
    result: MergeResult,
}

impl<W: Write> Copier<'_, W> {
    fn deliver(&mut self, delivery: &mut Delivery<'_>) -> Result<()> {
        let name = delivery.record.name.as_str();
        if let Some(transformer) = self.transformers.take(name) {
            log::debug!("transforming {}", name);
            let mut input = delivery.content.open()?;
            transformer.transform(&mut *input, &delivery.record, &mut *self.writer)?;
            if self.writer.has_open_entry() {
                self.writer.finish_entry()?;
            }
            self.result.entries_transformed += 1;
            return Ok(());
        }

        let record = delivery.record.copy_for_output(self.preserve_timestamps);
        let mut input = delivery.content.open()?;
        self.writer.add_stream(&record, &mut *input)?;
        match delivery.origin {
            Origin::Added => self.result.entries_added += 1,
            Origin::Existing => self.result.entries_copied += 1,
        }
        Ok(())
    }
}

/// Copies every delivery into `writer`, calling `observer` after each.
pub(crate) fn copy_entries<R: Read + Seek, W: Write>(
    config: &MergeConfig,
    archive: Option<&mut Archive<R>>,
    writer: &mut Writer<W>,
    observer: &mut dyn FnMut(&EntryRecord) -> Flow,
) -> Result<MergeResult> {
    let mut copier = Copier {
        writer,
        transformers: config.transformers.clone(),
        preserve_timestamps: config.preserve_timestamps,
        result: MergeResult::default(),
    };
    let plan = traverse(config, archive, &mut |delivery| {
        copier.deliver(delivery)?;
        Ok(observer(&delivery.record))
    })?;

    let mut result = copier.result;
    result.record_plan(plan);
    result.entries_written = copier.writer.entries_written();
    Ok(result)
}

impl MergeConfig {
    /// Runs the merge and writes the output archive.
    ///
    /// The archive comment of the source is kept unless the write options
    /// set one.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, an entry fails to
    /// copy or transform, or the output cannot be written or committed. An
    /// in-place run that fails leaves the source archive unchanged.
    pub fn process(&self) -> Result<MergeResult> {
        self.process_with(|_| Flow::Continue)
    }

    /// Runs the merge, calling `observer` after each delivered entry.
    ///
    /// Returning [`Flow::Stop`] ends the run early. A direct run then
    /// finishes a valid archive holding the entries written so far; an
    /// in-place run is rolled back and the source stays as it was.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    pub fn process_with<F>(&self, mut observer: F) -> Result<MergeResult>
    where
        F: FnMut(&EntryRecord) -> Flow,
    {
        let target = Target::resolve(self.source(), self.destination())?;
        let mut archive = self.open_source()?;

        let mut options = self.write_options.clone();
        if options.comment.is_none() {
            options.comment = archive
                .as_ref()
                .and_then(|a| a.comment())
                .map(str::to_string);
        }

        let sink = StagedFile::create(&target)?;
        let mut writer = Writer::create(sink)?
            .options(options)
            .encoding(self.encoding);

        let outcome = copy_entries(self, archive.as_mut(), &mut writer, &mut observer);
        drop(archive);

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => {
                log::debug!("merge failed: {}", e);
                if let Some(sink) = writer.abandon() {
                    StagedFile::rollback(sink);
                }
                return Err(e);
            }
        };

        if result.stopped && target.is_in_place() {
            log::debug!("stopped in place, discarding output");
            if let Some(sink) = writer.abandon() {
                StagedFile::rollback(sink);
            }
            result.entries_written = 0;
            result.entries_added = 0;
            result.entries_copied = 0;
            result.entries_transformed = 0;
            return Ok(result);
        }

        let written = match writer.write_directory() {
            Ok(written) => written,
            Err(e) => {
                log::debug!("finishing output failed: {}", e);
                if let Some(sink) = writer.abandon() {
                    StagedFile::rollback(sink);
                }
                return Err(e);
            }
        };
        StagedFile::commit(writer.into_sink()?, &target)?;
        result.bytes_written = written.archive_size;
        log::debug!(
            "merge wrote {} entries ({} bytes)",
            result.entries_written,
            result.bytes_written
        );
        Ok(result)
    }
}
