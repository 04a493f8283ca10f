extern crate raanes_2014;
extern crate util;

use raanes_2014::Raanes2014Setup;
use util::ModelTruth;

use std::process;

fn main() {
  let setup = Raanes2014Setup::default();

  println!("Simulating truth");
  let (assembly, data) = match setup.simulate(true) {
    Ok(v) => v,
    Err(e) => {
      eprintln!("twin experiment failed: {}", e);
      process::exit(1);
    },
  };

  let chrono = assembly.chronology();
  println!("m = {}, p = {}, steps = {}, observations = {}",
           assembly.dim(), assembly.observation().p(),
           chrono.steps(), chrono.k_obs());

  let recorded = data.recorded();
  let rms = (recorded.iter().map(|v| v * v).sum::<f64>() / recorded.len() as f64).sqrt();
  println!("recorded truth rms = {:.4}", rms);

  let obs = data.observations();
  let obs_times = data.obs_times();
  if obs_times.len() > 0 {
    println!("{} observations of {} points, t = {} .. {}",
             obs.nrows(), obs.ncols(), obs_times[0], obs_times[obs_times.len() - 1]);
  }
}
