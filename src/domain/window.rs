// Rolling chart window over enviro samples
use super::telemetry::{Channel, EnviroSample, SeriesPoint};
use std::collections::VecDeque;

/// Bounded FIFO of samples ordered by id. Appends keep the newest `capacity` rows.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    samples: VecDeque<EnviroSample>,
    cursor: i64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Appends new rows then truncates from the head.
    ///
    /// Rows at or below the cursor were already seen (or arrived late) and are
    /// skipped, so an inclusive `start` on the backend never duplicates a point.
    /// Returns the number of rows actually appended.
    pub fn append(&mut self, rows: Vec<EnviroSample>) -> usize {
        let mut appended = 0;
        for row in rows {
            if row.id <= self.cursor {
                continue;
            }
            self.cursor = row.id;
            self.samples.push_back(row);
            appended += 1;
        }

        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }

        appended
    }

    /// Id of the newest sample, sent as the exclusive `start` of the next fetch.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes effect on the next `append`.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnviroSample> {
        self.samples.iter()
    }

    pub fn series(&self, channel: Channel) -> Vec<SeriesPoint> {
        self.iter()
            .map(|s| SeriesPoint::new(s.id, s.reading(channel)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64, temperature: f64) -> EnviroSample {
        EnviroSample::new(id, [Some(temperature), None, None, None, None, None, None])
    }

    fn ids(window: &RollingWindow) -> Vec<i64> {
        window.iter().map(|s| s.id).collect()
    }

    #[test]
    fn test_keeps_tail_and_advances_cursor() {
        let mut window = RollingWindow::new(3);

        window.append(vec![sample(1, 10.0), sample(2, 11.0)]);
        assert_eq!(ids(&window), vec![1, 2]);
        assert_eq!(window.cursor(), 2);

        window.append(vec![sample(3, 12.0), sample(4, 13.0)]);
        assert_eq!(ids(&window), vec![2, 3, 4]);
        assert_eq!(window.cursor(), 4);
        assert_eq!(
            window.series(Channel::Temperature),
            vec![
                SeriesPoint::new(2, Some(11.0)),
                SeriesPoint::new(3, Some(12.0)),
                SeriesPoint::new(4, Some(13.0)),
            ]
        );
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let mut window = RollingWindow::new(5);
        let mut next = 1;
        let mut total = 0;
        for batch in [0usize, 1, 7, 2, 0, 12, 3] {
            let rows: Vec<_> = (0..batch)
                .map(|_| {
                    next += 1;
                    sample(next, next as f64)
                })
                .collect();
            total += batch;
            window.append(rows);

            assert!(window.len() <= 5);
            assert_eq!(window.len(), total.min(5));
            let expected: Vec<i64> = ((next - window.len() as i64 + 1)..=next).collect();
            assert_eq!(ids(&window), expected);
        }
    }

    #[test]
    fn test_empty_append_is_noop() {
        let mut window = RollingWindow::new(3);
        window.append(vec![sample(7, 1.0)]);

        assert_eq!(window.append(Vec::new()), 0);
        assert_eq!(ids(&window), vec![7]);
        assert_eq!(window.cursor(), 7);
    }

    #[test]
    fn test_cursor_row_is_not_duplicated() {
        let mut window = RollingWindow::new(10);
        window.append(vec![sample(1, 1.0), sample(2, 2.0)]);

        let appended = window.append(vec![sample(2, 2.0), sample(3, 3.0)]);
        assert_eq!(appended, 1);
        assert_eq!(ids(&window), vec![1, 2, 3]);
    }

    #[test]
    fn test_late_rows_are_dropped() {
        let mut window = RollingWindow::new(10);
        window.append(vec![sample(5, 5.0)]);
        window.append(vec![sample(3, 3.0), sample(4, 4.0)]);

        assert_eq!(ids(&window), vec![5]);
        assert_eq!(window.cursor(), 5);
    }

    #[test]
    fn test_capacity_change_applies_on_next_append() {
        let mut window = RollingWindow::new(4);
        window.append((1..=4).map(|i| sample(i, 0.0)).collect());

        window.set_capacity(2);
        assert_eq!(window.len(), 4);

        window.append(vec![sample(5, 0.0)]);
        assert_eq!(ids(&window), vec![4, 5]);
    }
}
