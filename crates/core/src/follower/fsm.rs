//! Guidance FSM engine
//!
//! Table-driven state machine executor: transition lookup, auto-transition
//! resolution and timeout tracking. One engine instance owns the active
//! goal, the current state, the navigation targets and the tick counter; no
//! global state is involved, so multiple engines can coexist and tests need
//! no process-wide reset.
//!
//! Neither goal table defines a per-state tick action, so every state falls
//! through to the navigation-mode dispatch: the entry action configures the
//! mode and targets, and the dispatch calls the matching control strategy
//! each tick.
//!
//! No internal locking: the engine is owned and driven by a single periodic
//! task, and all calls complete within a bounded number of operations.

use nalgebra::Vector3;

use super::goals::{auto_edge, next_state, Goal, Transition};
use super::nav::NavMode;
use super::traits::FollowerControl;
use super::types::{FollowerConfig, PathMode, PathTarget, VehicleState};

/// Discrete states shared by all goal tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    /// Invalid state transition occurred; terminal for this goal instance
    Fault,
    /// Starting state, normally auto-transitions immediately
    Init,
    /// Holding at the latched location
    Holding,
    /// Flying a path to a destination
    FlyingPath,
    /// Descending onto the latched location
    Landing,
    /// Short hold before returning to home
    PreRthHold,
    /// Hold above home before initiating landing
    PostRthHold,
    /// Request disarm after landing
    Disarm,
}

impl FsmState {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            FsmState::Fault => "Fault",
            FsmState::Init => "Init",
            FsmState::Holding => "Holding",
            FsmState::FlyingPath => "FlyingPath",
            FsmState::Landing => "Landing",
            FsmState::PreRthHold => "PreRthHold",
            FsmState::PostRthHold => "PostRthHold",
            FsmState::Disarm => "Disarm",
        }
    }
}

/// Events that can be injected into the FSM and trigger state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmEvent {
    /// Pass-through edge followed without an external trigger
    Auto,
    /// The armed state timer expired
    Timeout,
    /// The vehicle reached the current target
    HitTarget,
    /// The vehicle left the current target region
    LeftTarget,
}

/// Supervisory guidance state machine
///
/// Exactly one goal is active at a time; activating a goal (or deactivating
/// all goals) unconditionally reinitializes the machine.
pub struct GuidanceFsm {
    goal: Option<Goal>,
    state: FsmState,
    nav_mode: NavMode,
    hold_target: Vector3<f32>,
    path_target: PathTarget,
    tick_count: u32,
    timer_armed_at: u32,
    timer_duration_s: u32,
    disarm_requested: bool,
    config: FollowerConfig,
}

impl GuidanceFsm {
    /// Create an idle engine with no active goal.
    pub fn new(config: FollowerConfig) -> Self {
        Self {
            goal: None,
            state: FsmState::Init,
            nav_mode: NavMode::Idle,
            hold_target: Vector3::zeros(),
            path_target: PathTarget::default(),
            tick_count: 0,
            timer_armed_at: 0,
            timer_duration_s: 0,
            disarm_requested: false,
            config,
        }
    }

    /// Install `goal`'s transition table, reset to `Init` and resolve the
    /// auto-transition chain. Entry actions latch their targets from
    /// `vehicle`.
    pub fn activate(&mut self, goal: Goal, vehicle: &VehicleState) {
        self.goal = Some(goal);
        self.state = FsmState::Init;
        self.disarm_requested = false;
        self.arm_timeout(0);
        self.run_entry(FsmState::Init, vehicle);
        self.process_auto(vehicle);
    }

    /// Drop the active goal: the machine idles and performs no control
    /// action until the next `activate`.
    pub fn deactivate(&mut self) {
        self.goal = None;
        self.state = FsmState::Init;
        self.nav_mode = NavMode::Idle;
        self.arm_timeout(0);
    }

    /// Process `event` against the active goal's table.
    ///
    /// Ignored events are a no-op; any transition moves to the new state
    /// first and then runs its entry action (entry actions can never depend
    /// on the previous state), then resolves the auto chain.
    pub fn inject(&mut self, event: FsmEvent, vehicle: &VehicleState) {
        let Some(goal) = self.goal else {
            return;
        };
        match next_state(goal, self.state, event) {
            Transition::Unchanged => {}
            Transition::To(next) => {
                self.state = next;
                self.run_entry(next, vehicle);
                self.process_auto(vehicle);
            }
        }
    }

    /// One guidance period: dispatch the current navigation mode, advance
    /// the tick counter and fire the state timer when it expires.
    ///
    /// A control-strategy failure surfaces as the returned error; the FSM
    /// does not retry, the next tick simply calls again.
    pub fn tick(
        &mut self,
        vehicle: &VehicleState,
        control: &mut dyn FollowerControl,
    ) -> Result<(), &'static str> {
        self.dispatch(vehicle, control)?;

        self.tick_count = self.tick_count.wrapping_add(1);
        if self.timer_duration_s > 0 {
            let elapsed = self.tick_count.wrapping_sub(self.timer_armed_at);
            if elapsed as f32 * self.config.period >= self.timer_duration_s as f32 {
                self.inject(FsmEvent::Timeout, vehicle);
            }
        }
        Ok(())
    }

    /// Arm the state dwell timer; `0` disables it. Entry actions call this
    /// to configure how long the machine stays before a `Timeout` fires.
    pub fn arm_timeout(&mut self, seconds: u32) {
        self.timer_armed_at = self.tick_count;
        self.timer_duration_s = seconds;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Currently active goal, if any.
    pub fn goal(&self) -> Option<Goal> {
        self.goal
    }

    /// Current discrete state.
    pub fn state(&self) -> FsmState {
        self.state
    }

    /// Currently configured navigation mode.
    pub fn nav_mode(&self) -> NavMode {
        self.nav_mode
    }

    /// Hold/landing setpoint latched by the last entry action (m, NED).
    pub fn hold_target(&self) -> Vector3<f32> {
        self.hold_target
    }

    /// Path latched by the last fly-home entry action.
    pub fn path_target(&self) -> &PathTarget {
        &self.path_target
    }

    /// Number of ticks processed since construction.
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    /// True once the `Disarm` state was entered; the surrounding system
    /// performs the actual disarm.
    pub fn disarm_requested(&self) -> bool {
        self.disarm_requested
    }

    /// True when an unmodeled transition drove the machine to `Fault`.
    /// No transition leads out of `Fault`; the supervisor must force a
    /// safe fallback.
    pub fn is_faulted(&self) -> bool {
        self.state == FsmState::Fault
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Follow the auto-edge chain from the current state, running each
    /// entered state's entry action.
    fn process_auto(&mut self, vehicle: &VehicleState) {
        let Some(goal) = self.goal else {
            return;
        };
        while let Some(next) = auto_edge(goal, self.state) {
            self.state = next;
            self.run_entry(next, vehicle);
        }
    }

    /// Entry action for `state`: configure navigation mode, targets and
    /// dwell timer.
    fn run_entry(&mut self, state: FsmState, vehicle: &VehicleState) {
        match state {
            FsmState::Holding => self.enter_hold_here(vehicle, 0),
            FsmState::PreRthHold => self.enter_hold_here(vehicle, 10),
            FsmState::FlyingPath => self.enter_fly_home(vehicle),
            FsmState::PostRthHold => self.enter_pause_home(10),
            FsmState::Landing => self.enter_land_home(),
            FsmState::Disarm => {
                self.nav_mode = NavMode::Idle;
                self.disarm_requested = true;
                self.arm_timeout(0);
            }
            FsmState::Init | FsmState::Fault => {}
        }
    }

    /// Hold at the current location, never below the RTH safety altitude.
    fn enter_hold_here(&mut self, vehicle: &VehicleState, timeout_s: u32) {
        self.nav_mode = NavMode::Hold;
        self.hold_target = vehicle.position_ned;
        let floor = -self.config.rth_min_altitude;
        if self.hold_target.z > floor {
            self.hold_target.z = floor;
        }
        self.arm_timeout(timeout_s);
    }

    /// Hold above home at the altitude carried over from the previous
    /// state, clamped to the RTH safety altitude.
    fn enter_pause_home(&mut self, timeout_s: u32) {
        self.nav_mode = NavMode::Hold;
        self.hold_target.x = 0.0;
        self.hold_target.y = 0.0;
        let floor = -self.config.rth_min_altitude;
        if self.hold_target.z > floor {
            self.hold_target.z = floor;
        }
        self.arm_timeout(timeout_s);
    }

    /// Plot a straight course from the current position to above home,
    /// ascending to at least the RTH safety altitude.
    fn enter_fly_home(&mut self, vehicle: &VehicleState) {
        self.nav_mode = NavMode::Path;
        let mut end_down = vehicle.position_ned.z;
        let floor = -self.config.rth_min_altitude;
        if end_down > floor {
            end_down = floor;
        }
        self.path_target = PathTarget {
            start: vehicle.position_ned,
            end: Vector3::new(0.0, 0.0, end_down),
            start_velocity: self.config.rth_velocity,
            end_velocity: self.config.rth_velocity,
            mode: PathMode::Vector,
        };
        self.arm_timeout(0);
    }

    /// Descend onto home; the down component of the target is unused by the
    /// landing strategy.
    fn enter_land_home(&mut self) {
        self.nav_mode = NavMode::Land;
        self.hold_target = Vector3::zeros();
        self.arm_timeout(0);
    }

    /// Default per-tick action: farm the work out to the control strategy
    /// matching the configured navigation mode.
    fn dispatch(
        &mut self,
        vehicle: &VehicleState,
        control: &mut dyn FollowerControl,
    ) -> Result<(), &'static str> {
        let dt = self.config.period;
        match self.nav_mode {
            NavMode::Hold => {
                control.control_endpoint(dt, &self.hold_target)?;
                control.control_attitude(dt)
            }
            NavMode::Path => {
                let status = control.control_path(dt, &self.path_target)?;
                control.control_attitude(dt)?;
                if status.fractional_progress >= 1.0 {
                    self.inject(FsmEvent::HitTarget, vehicle);
                }
                Ok(())
            }
            NavMode::Land => {
                // The landed flag is advisory; touchdown is signaled by the
                // caller injecting HitTarget.
                let _landed =
                    control.control_land(dt, &self.hold_target, self.config.landing_velocity)?;
                control.control_attitude(dt)
            }
            NavMode::Idle => control.control_idle(dt),
        }
    }
}
