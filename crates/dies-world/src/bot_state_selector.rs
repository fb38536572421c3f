use dies_core::{BotState, WorldSettings};

/// Chooses between the vision-filtered and the self-reported state of a robot.
#[derive(Debug, Clone, Copy)]
pub struct BotStateSelector {
    prefer_robot_feedback: bool,
}

impl BotStateSelector {
    pub fn new(settings: &WorldSettings) -> Self {
        Self {
            prefer_robot_feedback: settings.prefer_robot_feedback,
        }
    }

    pub fn update_settings(&mut self, settings: &WorldSettings) {
        self.prefer_robot_feedback = settings.prefer_robot_feedback;
    }

    /// Select the state to use for a robot.
    ///
    /// If only one of the states is present, it is returned. If both are present,
    /// the internal state wins when robot feedback is preferred.
    pub fn select(
        &self,
        filtered: Option<&BotState>,
        internal: Option<&BotState>,
    ) -> Option<BotState> {
        match (filtered, internal) {
            (None, None) => None,
            (Some(filtered), None) => Some(*filtered),
            (None, Some(internal)) => Some(*internal),
            (Some(_), Some(internal)) if self.prefer_robot_feedback => Some(*internal),
            (Some(filtered), Some(_)) => Some(*filtered),
        }
    }
}

#[cfg(test)]
mod tests {
    use dies_core::{Angle, BotId, BotStateSource, Vector2};

    use super::*;

    fn state(x: f64, source: BotStateSource) -> BotState {
        BotState::new(BotId::blue(1), Vector2::new(x, 0.0), Angle::default(), source)
    }

    fn selector(prefer_robot_feedback: bool) -> BotStateSelector {
        BotStateSelector::new(&WorldSettings {
            prefer_robot_feedback,
            ..Default::default()
        })
    }

    #[test]
    fn single_source_is_used() {
        let filtered = state(1.0, BotStateSource::Filtered);
        let internal = state(2.0, BotStateSource::Internal);
        for prefer in [true, false] {
            let s = selector(prefer);
            assert_eq!(s.select(Some(&filtered), None), Some(filtered));
            assert_eq!(s.select(None, Some(&internal)), Some(internal));
            assert_eq!(s.select(None, None), None);
        }
    }

    #[test]
    fn preference_decides_when_both_present() {
        let filtered = state(1.0, BotStateSource::Filtered);
        let internal = state(2.0, BotStateSource::Internal);
        assert_eq!(
            selector(true).select(Some(&filtered), Some(&internal)),
            Some(internal)
        );
        assert_eq!(
            selector(false).select(Some(&filtered), Some(&internal)),
            Some(filtered)
        );
    }

    #[test]
    fn settings_reload_changes_preference() {
        let filtered = state(1.0, BotStateSource::Filtered);
        let internal = state(2.0, BotStateSource::Internal);
        let mut s = selector(true);
        s.update_settings(&WorldSettings {
            prefer_robot_feedback: false,
            ..Default::default()
        });
        assert_eq!(s.select(Some(&filtered), Some(&internal)), Some(filtered));
    }
}
