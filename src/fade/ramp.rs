use crate::backend::Volume;

/// Unit-step volume sequence from `from` to `to`, both inclusive.
#[derive(Debug, Clone)]
pub struct Ramp {
    next: Option<Volume>,
    to: Volume,
}

pub fn ramp(from: Volume, to: Volume) -> Ramp {
    Ramp {
        next: Some(from),
        to,
    }
}

impl Iterator for Ramp {
    type Item = Volume;

    fn next(&mut self) -> Option<Volume> {
        let cur = self.next?;
        self.next = match cur.cmp(&self.to) {
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Less => Some(cur + 1),
            std::cmp::Ordering::Greater => Some(cur - 1),
        };
        Some(cur)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self
            .next
            .map_or(0, |cur| usize::from(cur.abs_diff(self.to)) + 1);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Ramp {}
