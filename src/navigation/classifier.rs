//! Situation classification from the three sonar distances

use super::sampler::DistanceSampler;
use crate::config::ClassifierConfig;
use crate::core::types::{SensorTriple, Situation};

/// Maps a sensor triple onto one of the seven navigation situations
pub struct SituationClassifier {
    config: ClassifierConfig,
    /// Triple from the most recent [`classify`](Self::classify)
    triple: SensorTriple,
}

impl SituationClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            triple: SensorTriple::default(),
        }
    }

    /// Triple measured by the last `classify` call
    pub fn triple(&self) -> SensorTriple {
        self.triple
    }

    /// Sample all three sonars and classify the result
    pub fn classify(&mut self, sampler: &mut DistanceSampler) -> Situation {
        self.triple = sampler.sample_triple();
        let situation = self.evaluate(&self.triple);
        log::debug!("{} -> {}", self.triple, situation);
        situation
    }

    /// Apply the rule table to a triple. First match wins.
    ///
    /// | front | sides | situation |
    /// |---|---|---|
    /// | f > 50 | any | ClearAhead |
    /// | 40 < f <= 50 | any | SeekAlternate |
    /// | 30 < f <= 40 | any | PathClosing |
    /// | f <= 30 | l < 8 and r < 8 | NarrowCorridor |
    /// | f <= 30 | l >= 8 and l > r | ClearLeft |
    /// | f <= 30 | r >= 8 and r > l | ClearRight |
    /// | f <= 30 | l == r >= 8 | PathBlocked |
    pub fn evaluate(&self, triple: &SensorTriple) -> Situation {
        let c = &self.config;
        let SensorTriple { front, left, right } = *triple;

        if front > c.clear_ahead_cm {
            Situation::ClearAhead
        } else if front > c.seek_alternate_cm {
            Situation::SeekAlternate
        } else if front > c.path_closing_cm {
            Situation::PathClosing
        } else if left < c.side_clearance_cm && right < c.side_clearance_cm {
            Situation::NarrowCorridor
        } else if left >= c.side_clearance_cm && left > right {
            Situation::ClearLeft
        } else if right >= c.side_clearance_cm && right > left {
            Situation::ClearRight
        } else {
            // Both sides equally open: no side to prefer
            Situation::PathBlocked
        }
    }

    /// Long-range look for a wide bypass.
    ///
    /// Re-samples; returns ClearLeft/ClearRight toward the wider side when the
    /// front is within the seek range and either side is wide open, otherwise
    /// NarrowCorridor. Does not replace the cached triple.
    pub fn seek_alternate_route(&self, sampler: &mut DistanceSampler) -> Situation {
        let triple = sampler.sample_triple();
        let c = &self.config;

        let situation = if triple.front <= c.seek_alternate_cm
            && (triple.left > c.wide_bypass_cm || triple.right > c.wide_bypass_cm)
        {
            if triple.left >= triple.right {
                Situation::ClearLeft
            } else {
                Situation::ClearRight
            }
        } else {
            Situation::NarrowCorridor
        };

        log::debug!("seek alternate: {} -> {}", triple, situation);
        situation
    }
}
