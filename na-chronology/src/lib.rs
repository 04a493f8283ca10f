
extern crate na_core as nac;
extern crate ndarray as nd;

use nd::{Array, Ix1};

use nac::{Error, Result};

/// How far `horizon / dt` and `burn_in / dt` may sit from an integer,
/// relative to the ratio, before the schedule is rejected.
const RATIO_TOL: f64 = 1e-9;
/// Largest step count a schedule may have.
pub const MAX_STEPS: usize = ::std::u32::MAX as usize;

fn whole_steps(what: &str, span: f64, dt: f64) -> Result<usize> {
  let ratio = span / dt;
  if !(ratio <= MAX_STEPS as f64) {
    return Err(Error::config(format!("{} ({}) spans more than {} steps of dt ({})",
                                     what, span, MAX_STEPS, dt)));
  }
  let steps = ratio.round();
  if (ratio - steps).abs() > RATIO_TOL * ratio.abs().max(1.0) {
    return Err(Error::config(format!("{} ({}) is not a multiple of dt ({})",
                                     what, span, dt)));
  }
  Ok(steps as usize)
}

/// The discrete time grid of a twin experiment: step size, observation
/// cycle length, horizon and burn-in. Steps are numbered `0..=steps()`,
/// step 0 being the initial condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chronology {
  dt: f64,
  dk_obs: usize,
  horizon: f64,
  burn_in: f64,

  steps: usize,
  burn_in_steps: usize,
}

impl Chronology {
  pub fn new(dt: f64, dk_obs: usize, horizon: f64, burn_in: f64) -> Result<Chronology> {
    if !(dt > 0.0) || !dt.is_finite() {
      return Err(Error::config(format!("dt must be positive and finite, got {}", dt)));
    }
    if dk_obs < 1 {
      return Err(Error::config("dk_obs must be at least 1"));
    }
    if !horizon.is_finite() || !burn_in.is_finite() {
      return Err(Error::config("horizon and burn-in must be finite"));
    }
    if burn_in < 0.0 {
      return Err(Error::config(format!("burn-in must be non-negative, got {}", burn_in)));
    }
    if horizon < burn_in {
      return Err(Error::config(format!("horizon ({}) is shorter than the burn-in ({})",
                                       horizon, burn_in)));
    }

    let steps = whole_steps("horizon", horizon, dt)?;
    let burn_in_steps = whole_steps("burn-in", burn_in, dt)?;

    Ok(Chronology {
      dt: dt,
      dk_obs: dk_obs,
      horizon: horizon,
      burn_in: burn_in,
      steps: steps,
      burn_in_steps: burn_in_steps,
    })
  }

  pub fn dt(&self) -> f64 { self.dt }
  pub fn dk_obs(&self) -> usize { self.dk_obs }
  /// Time between two observations.
  pub fn dt_obs(&self) -> f64 { self.dk_obs as f64 * self.dt }
  pub fn horizon(&self) -> f64 { self.horizon }
  pub fn burn_in(&self) -> f64 { self.burn_in }

  /// K, the number of forward steps.
  pub fn steps(&self) -> usize { self.steps }
  pub fn burn_in_steps(&self) -> usize { self.burn_in_steps }
  /// Number of observation cycles within the horizon.
  pub fn k_obs(&self) -> usize {
    (self.steps - self.burn_in_steps) / self.dk_obs
  }

  pub fn time_of(&self, k: usize) -> f64 { k as f64 * self.dt }

  pub fn is_observation_time(&self, k: usize) -> bool {
    k > self.burn_in_steps && k <= self.steps &&
      (k - self.burn_in_steps) % self.dk_obs == 0
  }
  pub fn is_recording_time(&self, k: usize) -> bool {
    k >= self.burn_in_steps
  }

  /// Which observation cycle step `k` closes, if any.
  pub fn observation_index(&self, k: usize) -> Option<usize> {
    if self.is_observation_time(k) {
      Some((k - self.burn_in_steps) / self.dk_obs - 1)
    } else {
      None
    }
  }

  pub fn obs_steps(&self) -> Vec<usize> {
    (1..self.k_obs() + 1)
      .map(|i| self.burn_in_steps + i * self.dk_obs)
      .collect()
  }
  pub fn obs_times(&self) -> Array<f64, Ix1> {
    Array::from(self.obs_steps()
                .into_iter()
                .map(|k| self.time_of(k))
                .collect::<Vec<_>>())
  }
  /// `k * dt` for `k` in `0..=steps()`.
  pub fn times(&self) -> Array<f64, Ix1> {
    Array::from((0..self.steps + 1)
                .map(|k| self.time_of(k))
                .collect::<Vec<_>>())
  }

  pub fn ticker(&self) -> Ticker {
    Ticker {
      chrono: *self,
      k: 0,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
  /// Step reached by this tick, `1..=steps()`.
  pub k: usize,
  /// Set when step `k` is an observation time.
  pub k_obs: Option<usize>,
  /// Time at step `k`.
  pub t: f64,
  pub dt: f64,
}

/// Walks the schedule one step at a time.
#[derive(Debug, Clone)]
pub struct Ticker {
  chrono: Chronology,
  k: usize,
}
impl Ticker {
  pub fn advance(&mut self) -> Option<Tick> { self.next() }
}
impl Iterator for Ticker {
  type Item = Tick;
  fn next(&mut self) -> Option<Tick> {
    if self.k >= self.chrono.steps { return None; }
    self.k += 1;

    let k = self.k;
    Some(Tick {
      k: k,
      k_obs: self.chrono.observation_index(k),
      t: self.chrono.time_of(k),
      dt: self.chrono.dt,
    })
  }
  fn size_hint(&self) -> (usize, Option<usize>) {
    let left = self.chrono.steps - self.k;
    (left, Some(left))
  }
}
impl ExactSizeIterator for Ticker { }
