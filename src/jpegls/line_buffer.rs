/// Previous and current reconstructed line of one component.
///
/// Both lines hold `width + 2` samples: sample `x` lives at index `x + 1`,
/// index `0` and index `width + 1` carry the edge values of ISO/IEC 14495-1, A.2.1.
#[derive(Debug, Clone)]
pub struct ComponentLines {
    pub previous: Vec<u16>,
    pub current: Vec<u16>,
}

/// Causal neighbours of the sample at one line buffer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub ra: i32,
    pub rb: i32,
    pub rc: i32,
    pub rd: i32,
}

impl ComponentLines {
    pub fn new(width: usize) -> Self {
        Self {
            previous: vec![0; width + 2],
            current: vec![0; width + 2],
        }
    }

    /// Sets the edge samples before a line is coded.
    pub fn begin_line(&mut self) {
        let width = self.previous.len() - 2;
        self.previous[width + 1] = self.previous[width];
        self.current[0] = self.previous[1];
    }

    pub fn end_line(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    pub fn neighbors(&self, index: usize) -> Neighbors {
        Neighbors {
            ra: self.current[index - 1] as i32,
            rb: self.previous[index] as i32,
            rc: self.previous[index - 1] as i32,
            rd: self.previous[index + 1] as i32,
        }
    }

    /// The reconstructed samples of the current line.
    pub fn samples(&self) -> &[u16] {
        &self.current[1..self.current.len() - 1]
    }
}
