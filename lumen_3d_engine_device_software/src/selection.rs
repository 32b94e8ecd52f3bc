/// Selection-mode bookkeeping: the name stack and the hit records it produces.
///
/// A record is written whenever the name stack changes (or selection ends)
/// after at least one triangle touched the view volume. Each record holds the
/// name stack as it was while those triangles were drawn plus the depth range
/// they covered.

use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::lumen3d::render::HitRecord;

#[derive(Debug)]
pub struct Selection {
    capacity: usize,
    names: Vec<u32>,
    pending: Option<(f32, f32)>,
    records: Vec<HitRecord>,
    words: usize,
}

impl Selection {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            names: Vec::new(),
            pending: None,
            records: Vec::new(),
            words: 0,
        }
    }

    pub fn names(&self) -> &[u32] {
        &self.names
    }

    /// Register a triangle covering window depths `lo..=hi`
    pub fn hit(&mut self, lo: f32, hi: f32) {
        self.pending = Some(match self.pending {
            Some((min, max)) => (min.min(lo), max.max(hi)),
            None => (lo, hi),
        });
    }

    pub fn push_name(&mut self, name: u32) {
        self.flush();
        self.names.push(name);
    }

    /// Replace the top name; an empty stack is an error
    pub fn load_name(&mut self, name: u32) -> Result<()> {
        self.flush();
        match self.names.last_mut() {
            Some(top) => {
                *top = name;
                Ok(())
            }
            None => Err(Error::BackendError("load_name on an empty name stack".to_string())),
        }
    }

    pub fn pop_name(&mut self) -> Result<()> {
        self.flush();
        self.names
            .pop()
            .map(|_| ())
            .ok_or_else(|| Error::BackendError("name stack underflow".to_string()))
    }

    /// Close selection mode.
    ///
    /// # Errors
    ///
    /// `PickBufferOverflow` when the records need more words than the
    /// capacity the selection was opened with.
    pub fn finish(mut self) -> Result<Vec<HitRecord>> {
        self.flush();
        if self.words > self.capacity {
            return Err(Error::PickBufferOverflow {
                required: self.words,
                capacity: self.capacity,
            });
        }
        Ok(self.records)
    }

    fn flush(&mut self) {
        if let Some((lo, hi)) = self.pending.take() {
            let record = HitRecord {
                names: self.names.clone(),
                min_depth: HitRecord::encode_depth(lo as f64),
                max_depth: HitRecord::encode_depth(hi as f64),
            };
            self.words += record.word_count();
            self.records.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_are_recorded_on_name_change() {
        let mut selection = Selection::new(64);
        selection.push_name(0);
        selection.hit(0.4, 0.6);
        selection.hit(0.3, 0.5);
        selection.load_name(1).unwrap();
        selection.load_name(2).unwrap();
        selection.hit(0.1, 0.2);
        selection.pop_name().unwrap();

        let records = selection.finish().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].names, vec![0]);
        assert_eq!(records[0].min_depth, HitRecord::encode_depth(0.3f32 as f64));
        assert_eq!(records[0].max_depth, HitRecord::encode_depth(0.6f32 as f64));
        assert_eq!(records[1].names, vec![2]);
    }

    #[test]
    fn test_nested_names_are_kept_in_order() {
        let mut selection = Selection::new(64);
        selection.push_name(0);
        selection.load_name(3).unwrap();
        selection.push_name(1);
        selection.hit(0.5, 0.5);
        selection.pop_name().unwrap();
        selection.pop_name().unwrap();

        let records = selection.finish().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].names, vec![3, 1]);
    }

    #[test]
    fn test_overflow_reports_required_words() {
        let mut selection = Selection::new(4);
        selection.push_name(0);
        selection.hit(0.5, 0.5);
        selection.load_name(1).unwrap();
        selection.hit(0.5, 0.5);

        match selection.finish() {
            Err(Error::PickBufferOverflow { required, capacity }) => {
                assert_eq!(required, 8);
                assert_eq!(capacity, 4);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_name_stack_errors() {
        let mut selection = Selection::new(4);
        assert!(selection.load_name(1).is_err());
        assert!(selection.pop_name().is_err());
    }
}
