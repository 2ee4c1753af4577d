//! Emulator self-check scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// EMU-001: delayed, attenuated tone between two radios
    ToneLoopback,
    
    /// EMU-002: no port ever hears its own transmission
    SelfExclusion,
    
    /// EMU-003: reset leaves only the constant impairment floor
    ResetFloor,
    
    /// EMU-004: out-of-range gains clamp on both directions
    GainClamp,
    
    /// EMU-005: registering ports leaves existing channels untouched
    PortGrowth,
    
    /// EMU-006: radios streaming from their own threads
    ThreadedDuplex,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::ToneLoopback,
            ScenarioId::SelfExclusion,
            ScenarioId::ResetFloor,
            ScenarioId::GainClamp,
            ScenarioId::PortGrowth,
            ScenarioId::ThreadedDuplex,
        ]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::ToneLoopback => "tone_loopback",
            ScenarioId::SelfExclusion => "self_exclusion",
            ScenarioId::ResetFloor => "reset_floor",
            ScenarioId::GainClamp => "gain_clamp",
            ScenarioId::PortGrowth => "port_growth",
            ScenarioId::ThreadedDuplex => "threaded_duplex",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::ToneLoopback => "100-sample tone, 10-sample delay, 0.1 linear gain, read 120",
            ScenarioId::SelfExclusion => "Transmit on each port in turn, its own read stays silent",
            ScenarioId::ResetFloor => "Impaired noiseless channel, reset, read back a constant floor",
            ScenarioId::GainClamp => "Random gains far outside [-50, 50] dB read back clamped",
            ScenarioId::PortGrowth => "Grow the medium, existing pair models keep identity and values",
            ScenarioId::ThreadedDuplex => "One thread per radio writing and reading concurrently",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tone_loopback" | "loopback" | "emu-001" => Ok(ScenarioId::ToneLoopback),
            "self_exclusion" | "selfexclusion" | "emu-002" => Ok(ScenarioId::SelfExclusion),
            "reset_floor" | "resetfloor" | "emu-003" => Ok(ScenarioId::ResetFloor),
            "gain_clamp" | "gainclamp" | "emu-004" => Ok(ScenarioId::GainClamp),
            "port_growth" | "portgrowth" | "emu-005" => Ok(ScenarioId::PortGrowth),
            "threaded_duplex" | "duplex" | "emu-006" => Ok(ScenarioId::ThreadedDuplex),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
