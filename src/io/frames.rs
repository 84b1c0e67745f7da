//! Sample windowing utilities

/// Number of full frames that fit in `len` samples
///
/// Returns 0 when the signal is shorter than one frame or a size is zero.
pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if frame_length == 0 || hop_length == 0 || len < frame_length {
        return 0;
    }
    (len - frame_length) / hop_length + 1
}

/// Iterator over overlapping, non-padded frames of a sample slice
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    /// Source samples
    data: &'a [f32],
    /// Samples per frame
    frame_length: usize,
    /// Samples between frame starts
    hop_length: usize,
    /// Start of the next frame
    position: usize,
}

impl<'a> Frames<'a> {
    /// Create a frame iterator
    ///
    /// A zero `frame_length` or `hop_length` yields no frames.
    pub fn new(data: &'a [f32], frame_length: usize, hop_length: usize) -> Self {
        Self {
            data,
            frame_length,
            hop_length,
            position: 0,
        }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a [f32];

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame_length == 0 || self.hop_length == 0 {
            return None;
        }
        if self.position + self.frame_length > self.data.len() {
            return None;
        }

        let window = &self.data[self.position..self.position + self.frame_length];
        self.position += self.hop_length;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = frame_count(
            self.data.len().saturating_sub(self.position),
            self.frame_length,
            self.hop_length,
        );
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Frames<'_> {}
