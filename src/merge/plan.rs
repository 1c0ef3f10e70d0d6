//! Two-pass traversal producing one delivery per output name.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::read::Archive;
use crate::record::EntryRecord;
use crate::source::EntrySource;
use crate::Result;

use super::MergeConfig;

/// Whether a traversal goes on after a visited entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Visit the next entry.
    Continue,
    /// End the traversal; no further entries are visited.
    Stop,
}

/// Paths removed from the existing archive.
#[derive(Debug, Default)]
pub(crate) struct RemovalSet {
    paths: HashSet<String>,
    prefixes: Vec<String>,
}

impl RemovalSet {
    /// Builds the set; a removed path becomes a prefix when it ends with
    /// `/` or when `archive` has a directory entry of that name.
    pub(crate) fn new<R>(removed: &[String], archive: Option<&Archive<R>>) -> Self {
        let mut set = Self::default();
        for path in removed {
            if path.ends_with('/') {
                set.prefixes.push(path.clone());
            } else {
                let dir = format!("{}/", path);
                if archive.is_some_and(|a| a.contains(&dir)) {
                    set.prefixes.push(dir);
                }
            }
            set.paths.insert(path.clone());
        }
        set
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        self.paths.contains(name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// Where a delivered entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// An added source (pass 1).
    Added,
    /// An entry of the existing archive (pass 2).
    Existing,
}

/// Random access to entry streams by index.
pub(crate) trait EntryStreams {
    fn open_index(&mut self, index: usize) -> Result<Box<dyn Read + '_>>;
}

impl<R: Read + Seek> EntryStreams for Archive<R> {
    fn open_index(&mut self, index: usize) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.entry_reader(index)?))
    }
}

/// Lazy handle on the content of a delivery.
pub(crate) enum Content<'a> {
    Source(&'a dyn EntrySource),
    Existing {
        archive: &'a mut dyn EntryStreams,
        index: usize,
    },
}

impl Content<'_> {
    /// Opens the content stream.
    pub(crate) fn open(&mut self) -> Result<Box<dyn Read + '_>> {
        match self {
            Content::Source(source) => source.open(),
            Content::Existing { archive, index } => archive.open_index(*index),
        }
    }
}

/// One entry handed to a visitor.
pub(crate) struct Delivery<'a> {
    /// Record under its output name.
    pub(crate) record: EntryRecord,
    pub(crate) origin: Origin,
    pub(crate) content: Content<'a>,
}

/// Counters of a traversal.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlanStats {
    pub(crate) delivered: usize,
    pub(crate) excluded: usize,
    pub(crate) shadowed: usize,
    pub(crate) removed: usize,
    pub(crate) stopped: bool,
}

/// Visits added sources, then the entries of `archive`, skipping removed,
/// excluded and already visited names.
pub(crate) fn traverse<R: Read + Seek>(
    config: &MergeConfig,
    mut archive: Option<&mut Archive<R>>,
    visit: &mut dyn FnMut(&mut Delivery<'_>) -> Result<Flow>,
) -> Result<PlanStats> {
    let mut stats = PlanStats::default();
    let mut visited: HashSet<String> = HashSet::new();

    log::debug!("pass 1: {} added entries", config.added.len());
    for source in &config.added {
        let record = source.record()?;
        let Some(name) = config.map_name(&record.name) else {
            stats.excluded += 1;
            continue;
        };
        if !visited.insert(name.clone()) {
            log::debug!("skipping duplicate added entry {}", name);
            stats.shadowed += 1;
            continue;
        }
        let record = if name == record.name {
            record
        } else {
            record.renamed(name)
        };
        let mut delivery = Delivery {
            record,
            origin: Origin::Added,
            content: Content::Source(source.as_ref()),
        };
        stats.delivered += 1;
        if visit(&mut delivery)? == Flow::Stop {
            stats.stopped = true;
            return Ok(stats);
        }
    }

    let Some(archive) = archive.as_deref_mut() else {
        return Ok(stats);
    };
    let removals = RemovalSet::new(&config.removed, Some(&*archive));

    log::debug!("pass 2: {} existing entries", archive.len());
    for index in 0..archive.len() {
        let original = &archive.entries()[index].record;
        if removals.matches(&original.name) {
            stats.removed += 1;
            continue;
        }
        let Some(name) = config.map_name(&original.name) else {
            stats.excluded += 1;
            continue;
        };
        if !visited.insert(name.clone()) {
            stats.shadowed += 1;
            continue;
        }
        let record = original.renamed(name);
        let mut delivery = Delivery {
            record,
            origin: Origin::Existing,
            content: Content::Existing {
                archive: &mut *archive,
                index,
            },
        };
        stats.delivered += 1;
        if visit(&mut delivery)? == Flow::Stop {
            stats.stopped = true;
            return Ok(stats);
        }
    }
    Ok(stats)
}

/// What a plain iteration hands to the caller.
pub(crate) enum Visitor<'v> {
    /// Record and content stream.
    Content(&'v mut dyn FnMut(&EntryRecord, &mut dyn Read) -> Result<Flow>),
    /// Record only; content is never opened.
    Info(&'v mut dyn FnMut(&EntryRecord) -> Result<Flow>),
}

impl Visitor<'_> {
    fn visit(&mut self, delivery: &mut Delivery<'_>) -> Result<Flow> {
        match self {
            Visitor::Content(f) => {
                let mut input = delivery.content.open()?;
                f(&delivery.record, &mut *input)
            }
            Visitor::Info(f) => f(&delivery.record),
        }
    }
}

impl MergeConfig {
    /// Visits every entry the configuration would write, with its content.
    ///
    /// Entries come in output order under their output names, one per
    /// name. Removed and excluded entries are skipped; transformers are
    /// not applied and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the first error from opening the archive, reading an entry
    /// or the callback.
    pub fn iterate<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&EntryRecord, &mut dyn Read) -> Result<Flow>,
    {
        self.run_visitor(Visitor::Content(&mut f))
    }

    /// Visits the record of every entry the configuration would write.
    ///
    /// Like [`iterate`](Self::iterate) but no content stream is opened.
    ///
    /// # Errors
    ///
    /// Returns the first error from opening the archive or the callback.
    pub fn iterate_info<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&EntryRecord) -> Result<Flow>,
    {
        self.run_visitor(Visitor::Info(&mut f))
    }

    fn run_visitor(&self, mut visitor: Visitor<'_>) -> Result<()> {
        let mut archive = self.open_source()?;
        traverse(self, archive.as_mut(), &mut |d| visitor.visit(d))?;
        Ok(())
    }
}
