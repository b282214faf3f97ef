use crate::domain::models::{Color, RemainingTime};

/// A pair of countdown counters, one per color.
///
/// The clock only ticks whichever color it was last told to start; it knows nothing about
/// turns. Time is counted in ticks, and the caller decides how long a tick lasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clock {
    white: u32,
    black: u32,
    ticking: Option<Color>,
    flagged: Option<Color>,
}

impl Clock {
    pub fn new(allotment: u32) -> Self {
        Clock {
            white: allotment,
            black: allotment,
            ticking: None,
            flagged: None,
        }
    }

    /// Starts ticking `color`, pausing the other side.
    ///
    /// A color whose counter already reached zero never ticks again.
    pub fn start(&mut self, color: Color) {
        self.ticking = (self.remaining(color) > 0).then_some(color);
    }

    pub fn stop(&mut self) {
        self.ticking = None;
    }

    pub fn ticking(&self) -> Option<Color> {
        self.ticking
    }

    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn snapshot(&self) -> RemainingTime {
        RemainingTime {
            white: self.white,
            black: self.black,
        }
    }

    /// The color whose counter ran out, if any.
    pub fn flagged(&self) -> Option<Color> {
        self.flagged
    }

    /// Advances the ticking counter by one unit.
    ///
    /// Returns the color that just ran out of time. The expiry is reported on the tick that
    /// reaches zero and never again.
    pub fn tick(&mut self) -> Option<Color> {
        let color = self.ticking?;

        let counter = match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };

        *counter = counter.saturating_sub(1);

        if *counter > 0 {
            return None;
        }

        self.ticking = None;
        if self.flagged.is_some() {
            return None;
        }

        self.flagged = Some(color);
        Some(color)
    }
}
