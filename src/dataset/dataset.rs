//! Ordered entry collection with one-time splitting and JSON persistence.

use crate::dataset::entry::{Entry, Split};
use crate::{Error, Result};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

const RATIO_TOLERANCE: f64 = 1e-6;
const FLOOR_EPSILON: f64 = 1e-9;

/// Train/valid/test proportions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub valid: f64,
    pub test: f64,
}

impl SplitRatios {
    pub fn new(train: f64, valid: f64, test: f64) -> Result<Self> {
        let ratios = Self { train, valid, test };
        ratios.validate()?;
        Ok(ratios)
    }

    /// Ratios must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<()> {
        let parts = [self.train, self.valid, self.test];
        let sum: f64 = parts.iter().sum();
        if parts.iter().any(|r| !r.is_finite() || *r < 0.0) || (sum - 1.0).abs() > RATIO_TOLERANCE {
            return Err(Error::InvalidRatio { train: self.train, valid: self.valid, test: self.test });
        }
        Ok(())
    }

    /// `(train, valid)` sizes for `n` entries; test takes the remainder.
    pub fn sizes(&self, n: usize) -> (usize, usize) {
        let n_train = ((n as f64 * self.train + FLOOR_EPSILON).floor() as usize).min(n);
        let n_valid = ((n as f64 * self.valid + FLOOR_EPSILON).floor() as usize).min(n - n_train);
        (n_train, n_valid)
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self { train: 0.8, valid: 0.1, test: 0.1 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<Entry>,
    ratios: SplitRatios,
    is_split: bool,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ratios(ratios: SplitRatios) -> Result<Self> {
        ratios.validate()?;
        Ok(Self { ratios, ..Self::default() })
    }

    /// Entries that all carry a set (a loaded file, LC-QuAD's own
    /// train/test files) count as already split.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        let is_split = !entries.is_empty() && entries.iter().all(|e| e.split.is_some());
        Self { entries, is_split, ..Self::default() }
    }

    pub fn ratios(&self) -> SplitRatios {
        self.ratios
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn is_split(&self) -> bool {
        self.is_split
    }

    /// Entries assigned to `split`, in dataset order.
    pub fn entries_in(&self, split: Split) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(move |e| e.split == Some(split))
    }

    /// Shuffles once and partitions by the dataset's ratios.
    pub fn split<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.is_split {
            return Err(Error::AlreadySplit);
        }
        self.ratios.validate()?;

        self.entries.shuffle(rng);
        let (n_train, n_valid) = self.ratios.sizes(self.entries.len());
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.split = Some(if i < n_train {
                Split::Train
            } else if i < n_train + n_valid {
                Split::Valid
            } else {
                Split::Test
            });
        }
        self.is_split = true;

        info!(
            "Split {} entries: {} train, {} valid, {} test",
            self.entries.len(),
            n_train,
            n_valid,
            self.entries.len() - n_train - n_valid
        );
        Ok(())
    }

    /// Splits with explicit ratios, which replace the dataset's.
    pub fn split_with<R: Rng + ?Sized>(&mut self, ratios: SplitRatios, rng: &mut R) -> Result<()> {
        ratios.validate()?;
        if self.is_split {
            return Err(Error::AlreadySplit);
        }
        self.ratios = ratios;
        self.split(rng)
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Entry> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("entry {}", id)))
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Result<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("entry {}", id)))
    }

    pub fn to_records(&self) -> Result<Vec<Value>> {
        let incomplete = self.entries.iter().filter(|e| !e.is_complete()).count();
        if incomplete > 0 {
            warn!("{} of {} entries are incomplete", incomplete, self.entries.len());
        }
        self.entries.iter().map(Entry::to_record).collect()
    }

    pub fn from_records(records: &[Value]) -> Result<Self> {
        let entries = records.iter().map(Entry::from_record).collect::<Result<Vec<_>>>()?;
        Ok(Self::from_entries(entries))
    }

    /// Writes the dataset as a pretty-printed JSON array.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        self.to_records()?.serialize(&mut serializer)?;
        writer.flush()?;
        info!("Saved {} entries to {}", self.entries.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<Value> = serde_json::from_str(&raw)?;
        Self::from_records(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset(n: usize) -> Dataset {
        Dataset::from_entries((0..n).map(|i| Entry::new(i.to_string())).collect())
    }

    #[test]
    fn test_ratio_validation() {
        assert!(SplitRatios::new(0.7, 0.2, 0.1).is_ok());
        assert!(matches!(SplitRatios::new(0.8, 0.1, 0.2), Err(Error::InvalidRatio { .. })));
        assert!(SplitRatios::new(1.2, -0.1, -0.1).is_err());
    }

    #[test]
    fn test_split_sizes() {
        let mut data = dataset(10);
        data.split(&mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(data.entries_in(Split::Train).count(), 8);
        assert_eq!(data.entries_in(Split::Valid).count(), 1);
        assert_eq!(data.entries_in(Split::Test).count(), 1);
    }

    #[test]
    fn test_split_is_seeded() {
        let mut a = dataset(30);
        let mut b = dataset(30);
        a.split(&mut StdRng::seed_from_u64(3)).unwrap();
        b.split(&mut StdRng::seed_from_u64(3)).unwrap();
        let ids = |d: &Dataset| d.entries().iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_split_only_once() {
        let mut data = dataset(4);
        let mut rng = StdRng::seed_from_u64(1);
        data.split(&mut rng).unwrap();
        assert!(matches!(data.split(&mut rng), Err(Error::AlreadySplit)));
    }

    #[test]
    fn test_entries_with_sets_count_as_split() {
        let mut data = dataset(3);
        for entry in data.entries_mut() {
            entry.question.question = Some(format!("where is {} ?", entry.id));
            entry.query.pure_sparql = Some(format!("select ?x where {{ dbr:E{} dbo:location ?x }}", entry.id));
        }
        data.split(&mut StdRng::seed_from_u64(5)).unwrap();

        let mut reloaded = Dataset::from_records(&data.to_records().unwrap()).unwrap();
        assert!(reloaded.is_split());
        assert!(matches!(reloaded.split(&mut StdRng::seed_from_u64(6)), Err(Error::AlreadySplit)));

        let mut partial = data.into_entries();
        partial[0].split = None;
        assert!(!Dataset::from_entries(partial).is_split());
        assert!(!Dataset::from_entries(Vec::new()).is_split());
    }

    #[test]
    fn test_get_by_id() {
        let data = dataset(3);
        assert_eq!(data.get_by_id("2").unwrap().id, "2");
        assert!(matches!(data.get_by_id("9"), Err(Error::NotFound(_))));
    }
}
