//! A genetic search over stop permutations used when construction heuristics
//! are not good enough for the problem size.

#[cfg(test)]
#[path = "../../tests/unit/evolution/evolution_test.rs"]
mod evolution_test;

mod operators;
use self::operators::*;

use crate::construction::heuristics::{plan_greedy, PlanningContext};
use crate::models::solution::Stop;
use crate::utils::{Environment, GenericResult, Random};

/// Configures the genetic search.
#[derive(Clone, Debug)]
pub struct EvolutionConfig {
    /// Amount of generations to run. The search always terminates after this bound.
    pub generations: usize,
    /// An upper bound for the population size.
    pub max_population: usize,
    /// A probability to mutate an offspring.
    pub mutation_rate: f64,
    /// Amount of individuals taking part in a tournament selection.
    pub tournament_size: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self { generations: 50, max_population: 20, mutation_rate: 0.1, tournament_size: 3 }
    }
}

/// Provides a way to override genetic search parameters with validation.
#[derive(Default)]
pub struct EvolutionConfigBuilder {
    config: EvolutionConfig,
}

impl EvolutionConfigBuilder {
    /// Sets amount of generations to run.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.config.generations = generations;
        self
    }

    /// Sets an upper bound for the population size.
    pub fn with_max_population(mut self, max_population: usize) -> Self {
        self.config.max_population = max_population;
        self
    }

    /// Sets a probability to mutate an offspring.
    pub fn with_mutation_rate(mut self, mutation_rate: f64) -> Self {
        self.config.mutation_rate = mutation_rate;
        self
    }

    /// Sets amount of individuals taking part in a tournament selection.
    pub fn with_tournament_size(mut self, tournament_size: usize) -> Self {
        self.config.tournament_size = tournament_size;
        self
    }

    /// Builds the config.
    pub fn build(self) -> GenericResult<EvolutionConfig> {
        let config = self.config;

        if config.generations == 0 {
            return Err("generations bound must be positive".into());
        }

        if config.max_population < 2 {
            return Err("population must keep at least two individuals".into());
        }

        if !(0. ..=1.).contains(&config.mutation_rate) {
            return Err("mutation rate must be a probability".into());
        }

        if config.tournament_size == 0 {
            return Err("tournament must select from at least one individual".into());
        }

        Ok(config)
    }
}

struct Individual {
    permutation: Vec<usize>,
    cost: f64,
    violations: usize,
}

impl Individual {
    fn fitness(&self, penalty: f64) -> f64 {
        self.cost + penalty * self.violations as f64
    }

    fn is_better_than(&self, other: &Self) -> bool {
        self.violations < other.violations
            || (self.violations == other.violations && self.cost < other.cost)
    }
}

/// Runs a bounded genetic search over permutations of the given stops. The initial population
/// is seeded with the greedy insertion individual, so the best found sequence never loses to it.
/// Returns the best sequence and a flag whether it still violates some constraints.
pub(crate) fn evolve_sequence(
    ctx: &PlanningContext,
    stops: Vec<Stop>,
    config: &EvolutionConfig,
    environment: &Environment,
) -> (Vec<Stop>, bool) {
    let random = environment.random.as_ref();
    let size = stops.len();

    let population_size = config.max_population.min((2 * size).max(4));
    let penalty = ctx.costs.violation_penalty;

    let seed = plan_greedy(ctx, stops.clone())
        .ok()
        .map(|sequence| as_permutation(&stops, &sequence))
        .unwrap_or_else(|| repair(&stops, (0..size).collect()));

    let mut population: Vec<Individual> = Vec::with_capacity(population_size);
    population.push(evaluate(ctx, &stops, seed));
    while population.len() < population_size {
        let mut permutation: Vec<usize> = (0..size).collect();
        random.shuffle(&mut permutation);
        population.push(evaluate(ctx, &stops, repair(&stops, permutation)));
    }

    let mut best = clone_individual(best_of(&population));

    for _ in 0..config.generations {
        let mut offspring: Vec<Individual> = Vec::with_capacity(population_size);
        offspring.push(clone_individual(&best));

        while offspring.len() < population_size {
            let first = tournament(&population, config.tournament_size, penalty, random);
            let second = tournament(&population, config.tournament_size, penalty, random);

            let mut child = order_crossover(&population[first].permutation, &population[second].permutation, random);
            if random.is_hit(config.mutation_rate) {
                swap_mutation(&mut child, random);
            }

            offspring.push(evaluate(ctx, &stops, repair(&stops, child)));
        }

        population = offspring;

        let generation_best = best_of(&population);
        if generation_best.is_better_than(&best) {
            best = clone_individual(generation_best);
        }
    }

    (environment.logger)(&format!(
        "genetic search: {} stops, {} generations, best cost {:.3}, violations {}",
        size, config.generations, best.cost, best.violations
    ));

    (materialize(&stops, &best.permutation), best.violations > 0)
}

fn evaluate(ctx: &PlanningContext, stops: &[Stop], permutation: Vec<usize>) -> Individual {
    let summary = ctx.evaluate(&materialize(stops, &permutation));
    Individual { permutation, cost: summary.cost, violations: summary.violations }
}

fn best_of(population: &[Individual]) -> &Individual {
    population
        .iter()
        .reduce(|best, other| if other.is_better_than(best) { other } else { best })
        .expect("population cannot be empty")
}

fn clone_individual(individual: &Individual) -> Individual {
    Individual { permutation: individual.permutation.clone(), cost: individual.cost, violations: individual.violations }
}

fn tournament(population: &[Individual], size: usize, penalty: f64, random: &dyn Random) -> usize {
    let mut winner = random.uniform_int(0, population.len() as i32 - 1) as usize;

    for _ in 1..size {
        let challenger = random.uniform_int(0, population.len() as i32 - 1) as usize;
        if population[challenger].fitness(penalty) < population[winner].fitness(penalty) {
            winner = challenger;
        }
    }

    winner
}

fn materialize(stops: &[Stop], permutation: &[usize]) -> Vec<Stop> {
    permutation.iter().map(|&index| stops[index].clone()).collect()
}

fn as_permutation(stops: &[Stop], sequence: &[Stop]) -> Vec<usize> {
    sequence
        .iter()
        .filter_map(|stop| {
            stops.iter().position(|other| other.order_id == stop.order_id && other.kind == stop.kind)
        })
        .collect()
}
