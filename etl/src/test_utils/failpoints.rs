use fail::FailScenario;

/// Enables a set of fail points for the lifetime of the value.
///
/// Fail points are process global, tests using them must not run in parallel
/// with each other.
pub struct FailPointsScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<String>,
}

impl<'a> FailPointsScenario<'a> {
    /// Configures each `(name, action)` pair, see [`fail::cfg`] for the action syntax.
    pub fn setup(failpoints: &[(&str, &str)]) -> FailPointsScenario<'a> {
        let scenario = FailScenario::setup();

        for (failpoint, action) in failpoints {
            fail::cfg(*failpoint, action).unwrap();
        }

        Self {
            _scenario: scenario,
            failpoints: failpoints
                .iter()
                .map(|(failpoint, _)| failpoint.to_string())
                .collect(),
        }
    }

    /// Turns every configured fail point off while keeping the scenario alive.
    pub fn disable(&self) {
        for failpoint in &self.failpoints {
            fail::cfg(failpoint, "off").unwrap();
        }
    }
}

impl Drop for FailPointsScenario<'_> {
    fn drop(&mut self) {
        self.disable();
    }
}
