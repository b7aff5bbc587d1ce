use clap::Parser;

use std::path::PathBuf;
use std::time::Duration;
use crate::{Formulation, Method, Weighting};
use crate::solvers::SolverParameters;

#[derive(Parser, Debug, Clone)]
#[clap(name="Landscape_opt", version, author, about)]
pub struct Args {
    /// The index file of the landscape (CSV naming the patches and links files)
    #[clap(short, long, value_parser)]
    landscape: PathBuf,
    /// The restoration plan file
    #[clap(short, long, value_parser)]
    plan: PathBuf,
    /// The budget available to fund the restoration options
    #[clap(short, long)]
    budget: f64,
    /// The method used to select the options
    #[clap(short, long, value_enum, default_value_t=Method::PlEca)]
    method: Method,
    /// The MIP formulation solved (or relaxed) by the method
    #[clap(short, long, value_enum, default_value_t=Formulation::PlEca3)]
    formulation: Formulation,
    /// Seed of the random generators
    #[clap(short, long, default_value_t=2024)]
    seed: u64,
    /// Number of trials of the randomized rounding
    #[clap(long, default_value_t=100)]
    trials: usize,
    /// Stops the branch-and-bound after timeout seconds
    #[clap(short, long, default_value_t=u64::MAX)]
    timeout: u64,
    /// Stops the branch-and-bound after this number of nodes
    #[clap(long)]
    node_limit: Option<usize>,
    /// If present, only solve the linear relaxation of the formulation
    #[clap(long, action)]
    relaxed: bool,
    /// Weights of the options when drawn by the randomized rounding
    #[clap(short, long, value_enum, default_value_t=Weighting::Fractional)]
    weighting: Weighting,
    /// Number of threads running the randomized rounding trials
    #[clap(long, default_value_t=1, short)]
    jobs: usize,
    /// Collect stats during the search
    #[clap(long, action)]
    statistics: bool,
    /// If present, folder in which to store the log of the randomized rounding trials
    #[clap(long)]
    outfolder: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            landscape: PathBuf::default(),
            plan: PathBuf::default(),
            budget: 0.0,
            method: Method::PlEca,
            formulation: Formulation::PlEca3,
            seed: 2024,
            trials: 100,
            timeout: u64::MAX,
            node_limit: None,
            relaxed: false,
            weighting: Weighting::Fractional,
            jobs: 1,
            statistics: false,
            outfolder: None,
        }
    }
}

impl Args {

    pub fn solver_param(&self) -> SolverParameters {
        let timeout = if self.timeout == u64::MAX { None } else { Some(Duration::from_secs(self.timeout)) };
        SolverParameters::new(self.formulation, self.seed, self.trials, timeout, self.node_limit)
            .with_relaxed(self.relaxed)
            .with_weighting(self.weighting)
            .with_jobs(self.jobs)
            .with_outfolder(self.outfolder.clone())
            .with_statistics(self.statistics)
    }

    pub fn landscape(&self) -> &PathBuf {
        &self.landscape
    }

    pub fn plan(&self) -> &PathBuf {
        &self.plan
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn formulation(&self) -> Formulation {
        self.formulation
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.node_limit
    }

    pub fn relaxed(&self) -> bool {
        self.relaxed
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn statistics(&self) -> bool {
        self.statistics
    }

    pub fn outfolder(&self) -> Option<PathBuf> {
        self.outfolder.clone()
    }

    pub fn set_landscape(&mut self, value: PathBuf) {
        self.landscape = value;
    }

    pub fn set_plan(&mut self, value: PathBuf) {
        self.plan = value;
    }

    pub fn set_budget(&mut self, value: f64) {
        self.budget = value;
    }

    pub fn set_method(&mut self, value: Method) {
        self.method = value;
    }

    pub fn set_formulation(&mut self, value: Formulation) {
        self.formulation = value;
    }

    pub fn set_seed(&mut self, value: u64) {
        self.seed = value;
    }

    pub fn set_trials(&mut self, value: usize) {
        self.trials = value;
    }

    pub fn set_timeout(&mut self, value: u64) {
        self.timeout = value;
    }

    pub fn set_node_limit(&mut self, value: Option<usize>) {
        self.node_limit = value;
    }

    pub fn set_relaxed(&mut self, value: bool) {
        self.relaxed = value;
    }

    pub fn set_weighting(&mut self, value: Weighting) {
        self.weighting = value;
    }

    pub fn set_jobs(&mut self, value: usize) {
        self.jobs = value;
    }

    pub fn set_statistics(&mut self, value: bool) {
        self.statistics = value;
    }

    pub fn set_outfolder(&mut self, value: Option<PathBuf>) {
        self.outfolder = value;
    }
}

#[cfg(test)]
mod test_args {
    use std::time::Duration;

    use clap::Parser;
    use crate::args::Args;
    use crate::{Formulation, Method, Weighting};

    #[test]
    pub fn parse_command_line() {
        let args = Args::parse_from(["landscape_opt", "-l", "aude.index", "-p", "aude.plan", "-b", "12.5", "-m", "randomized-rounding", "--trials", "7", "-w", "gain-weighted", "-t", "30"]);
        assert_eq!(12.5, args.budget());
        assert_eq!(Method::RandomizedRounding, args.method());
        assert_eq!(Formulation::PlEca3, args.formulation());
        assert_eq!(Weighting::GainWeighted, args.weighting());
        let parameters = args.solver_param();
        assert_eq!(7, parameters.trials());
        assert_eq!(Some(Duration::from_secs(30)), parameters.timeout());
        assert_eq!(None, parameters.node_limit());
    }

    #[test]
    pub fn default_has_no_limits() {
        let mut args = Args::default();
        args.set_node_limit(Some(10));
        let parameters = args.solver_param();
        assert_eq!(None, parameters.timeout());
        assert_eq!(Some(10), parameters.node_limit());
        assert_eq!(1, parameters.jobs());
    }
}
