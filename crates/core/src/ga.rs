//! Genetic search over placement order and part rotation.
//!
//! A genome ([`Phenotype`]) is an ordering of the input nodes plus one
//! rotation angle per position. Fitness is assigned from outside (by the
//! placement workers); lower is better and `None` marks an unevaluated genome.
//!
//! [`GeneticSearch::next_individual`] hands out unevaluated genomes one by
//! one. Once the whole population carries a fitness it runs one generation
//! step:
//!
//! 1. sort ascending by fitness and carry the best genome over unchanged,
//! 2. pick two distinct parents with rank-weighted selection,
//! 3. single-point crossover with the cut in `[0.1, 0.9]` of the length,
//! 4. mutate both children (successor swap and rotation reassignment, each
//!    with probability `mutation_rate / 100` per gene).

use crate::bound_rect::BoundRect;
use crate::config::NestConfig;
use crate::error::{Error, Result};
use crate::node::PolygonNode;
use crate::rotation::RotationTable;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One candidate solution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Phenotype {
    /// Node indices in placement order.
    pub placement: Vec<usize>,
    /// Rotation in degrees for each position of `placement`.
    pub rotation: Vec<f64>,
    /// Assigned fitness, `None` until evaluated.
    pub fitness: Option<f64>,
}

impl Phenotype {
    pub fn new(placement: Vec<usize>, rotation: Vec<f64>) -> Self {
        Self {
            placement,
            rotation,
            fitness: None,
        }
    }

    pub fn len(&self) -> usize {
        self.placement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placement.is_empty()
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }
}

/// Population manager for the nesting search.
#[derive(Debug)]
pub struct GeneticSearch {
    nodes: Vec<PolygonNode>,
    bin_bounds: BoundRect,
    rotations: Arc<RotationTable>,
    population_size: usize,
    mutation_rate: f64,
    population: Vec<Phenotype>,
    generation: u32,
    rng: StdRng,
}

impl GeneticSearch {
    /// Seeds a population from `nodes`.
    ///
    /// The first genome orders nodes by descending area with a random
    /// bin-fitting rotation per node; the rest are mutations of it.
    pub fn init(
        nodes: Vec<PolygonNode>,
        bin_bounds: BoundRect,
        config: &NestConfig,
        rotations: Arc<RotationTable>,
    ) -> Result<Self> {
        Self::init_with_rng(nodes, bin_bounds, config, rotations, StdRng::from_entropy())
    }

    /// Same as [`GeneticSearch::init`] with a caller-provided generator.
    pub fn init_with_rng(
        nodes: Vec<PolygonNode>,
        bin_bounds: BoundRect,
        config: &NestConfig,
        rotations: Arc<RotationTable>,
        rng: StdRng,
    ) -> Result<Self> {
        if config.population_size == 0 {
            return Err(Error::ConfigError("population_size must be at least 1".into()));
        }

        let mut search = Self {
            nodes,
            bin_bounds,
            rotations,
            population_size: config.population_size,
            mutation_rate: f64::from(config.mutation_rate) * 0.01,
            population: Vec::with_capacity(config.population_size),
            generation: 0,
            rng,
        };

        let mut order: Vec<usize> = (0..search.nodes.len()).collect();
        order.sort_by(|&a, &b| {
            search.nodes[b]
                .area()
                .partial_cmp(&search.nodes[a].area())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let angles: Vec<f64> = order.iter().map(|&i| search.random_angle(i)).collect();
        let adam = Phenotype::new(order, angles);

        while search.population.len() + 1 < search.population_size {
            let child = search.mutate(&adam);
            search.population.push(child);
        }
        search.population.insert(0, adam);

        Ok(search)
    }

    /// The nodes genomes index into.
    pub fn nodes(&self) -> &[PolygonNode] {
        &self.nodes
    }

    pub fn population(&self) -> &[Phenotype] {
        &self.population
    }

    /// Number of completed generation steps.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn phenotype(&self, index: usize) -> &Phenotype {
        &self.population[index]
    }

    /// Records the fitness of the genome at `index`.
    pub fn set_fitness(&mut self, index: usize, fitness: f64) {
        if let Some(individual) = self.population.get_mut(index) {
            individual.fitness = Some(fitness);
        }
    }

    /// Best evaluated genome so far in the current population.
    pub fn best(&self) -> Option<&Phenotype> {
        self.population
            .iter()
            .filter(|p| p.is_evaluated())
            .min_by(|a, b| compare_fitness(a, b))
    }

    /// Index of the next genome to evaluate, advancing one generation when
    /// every genome already carries a fitness.
    pub fn next_individual(&mut self) -> usize {
        if let Some(index) = self.first_unevaluated() {
            return index;
        }
        self.generation_step();
        self.first_unevaluated().unwrap_or(0)
    }

    fn first_unevaluated(&self) -> Option<usize> {
        self.population.iter().position(|p| !p.is_evaluated())
    }

    /// Builds the next population from the current, fully evaluated one.
    pub fn generation_step(&mut self) {
        self.population.sort_by(compare_fitness);

        let mut next = Vec::with_capacity(self.population_size);
        next.push(self.population[0].clone());

        while next.len() < self.population_size {
            let male = self.select_weighted(None);
            let female = self.select_weighted(Some(male));
            let (first, second) = self.mate(male, female);

            next.push(self.mutate(&first));
            if next.len() < self.population_size {
                next.push(self.mutate(&second));
            }
        }

        self.population = next;
        self.generation += 1;
        log::debug!(
            "generation {} built, best fitness {:?}",
            self.generation,
            self.population[0].fitness
        );
    }

    /// Rank-weighted parent selection over the sorted population.
    ///
    /// Slot `i` of `n` covers a probability interval that shrinks linearly
    /// with rank, so the front of the list is picked more often. `exclude`
    /// keeps the same genome from filling both parent roles.
    fn select_weighted(&mut self, exclude: Option<usize>) -> usize {
        let candidates: Vec<usize> = (0..self.population.len())
            .filter(|&i| Some(i) != exclude)
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        let len = candidates.len() as f64;
        let roll: f64 = self.rng.gen();
        let weight = 1.0 / len;
        let mut lower = 0.0;
        let mut upper = weight;

        for (rank, &index) in candidates.iter().enumerate() {
            if roll > lower && roll < upper {
                return index;
            }
            lower = upper;
            upper += 2.0 * weight * ((len - rank as f64) / len);
        }

        candidates[0]
    }

    /// Single-point crossover producing two children.
    fn mate(&mut self, male: usize, female: usize) -> (Phenotype, Phenotype) {
        let fraction: f64 = self.rng.gen::<f64>().clamp(0.1, 0.9);
        let male = &self.population[male];
        let female = &self.population[female];
        let len = male.len();
        let cut = (fraction * len.saturating_sub(1) as f64).round() as usize;

        let first = crossover(&self.nodes, male, female, cut);
        let second = crossover(&self.nodes, female, male, cut);
        (first, second)
    }

    /// Returns a mutated copy of `parent`.
    fn mutate(&mut self, parent: &Phenotype) -> Phenotype {
        let mut child = Phenotype::new(parent.placement.clone(), parent.rotation.clone());
        let len = child.len();

        for i in 0..len {
            if self.rng.gen::<f64>() < self.mutation_rate && i + 1 < len {
                child.placement.swap(i, i + 1);
            }
            if self.rng.gen::<f64>() < self.mutation_rate {
                child.rotation[i] = self.random_angle(child.placement[i]);
            }
        }

        child
    }

    /// A random rotation under which the node's bounds fit strictly inside
    /// the bin bounds, or 0 when none does.
    fn random_angle(&mut self, node: usize) -> f64 {
        let mut angles = self.rotations.angles().to_vec();
        angles.shuffle(&mut self.rng);

        let polygon = &self.nodes[node].polygon;
        angles
            .into_iter()
            .find(|&angle| {
                polygon
                    .rotated(&self.rotations, angle)
                    .bounds()
                    .fits_inside(&self.bin_bounds)
            })
            .unwrap_or(0.0)
    }
}

fn compare_fitness(a: &Phenotype, b: &Phenotype) -> std::cmp::Ordering {
    let a = a.fitness.unwrap_or(f64::INFINITY);
    let b = b.fitness.unwrap_or(f64::INFINITY);
    a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
}

/// Takes `head[..cut]` and fills the rest from `tail` in order, skipping
/// nodes whose source is already present.
fn crossover(nodes: &[PolygonNode], head: &Phenotype, tail: &Phenotype, cut: usize) -> Phenotype {
    let cut = cut.min(head.len());
    let mut placement = head.placement[..cut].to_vec();
    let mut rotation = head.rotation[..cut].to_vec();

    for (i, &gene) in tail.placement.iter().enumerate() {
        let source = nodes[gene].source;
        if !placement.iter().any(|&g| nodes[g].source == source) {
            placement.push(gene);
            rotation.push(tail.rotation[i]);
        }
    }

    Phenotype::new(placement, rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Polygon;

    fn nodes(count: usize) -> Vec<PolygonNode> {
        (0..count)
            .map(|i| {
                let size = 5.0 + i as f64;
                PolygonNode::new(i as i32, Polygon::rectangle(0.0, 0.0, size, size * 0.5))
            })
            .collect()
    }

    fn search(count: usize, config: &NestConfig, seed: u64) -> GeneticSearch {
        GeneticSearch::init_with_rng(
            nodes(count),
            BoundRect::new(0.0, 0.0, 100.0, 100.0),
            config,
            Arc::new(RotationTable::new(config.rotations)),
            StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    fn assert_permutation(phenotype: &Phenotype, count: usize) {
        let mut genes = phenotype.placement.clone();
        genes.sort_unstable();
        assert_eq!(genes, (0..count).collect::<Vec<_>>());
        assert_eq!(phenotype.rotation.len(), count);
    }

    #[test]
    fn test_init_population() {
        let config = NestConfig::new().with_population_size(12).with_mutation_rate(50);
        let ga = search(8, &config, 7);

        assert_eq!(ga.population().len(), 12);
        for individual in ga.population() {
            assert_permutation(individual, 8);
            assert!(!individual.is_evaluated());
        }
    }

    #[test]
    fn test_seed_sorted_by_area() {
        let config = NestConfig::new().with_population_size(3);
        let ga = search(5, &config, 1);
        assert_eq!(ga.population()[0].placement, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rotations_fit_bin() {
        let config = NestConfig::new().with_population_size(4).with_rotations(4);
        let long = PolygonNode::new(0, Polygon::rectangle(0.0, 0.0, 90.0, 10.0));
        let ga = GeneticSearch::init_with_rng(
            vec![long],
            BoundRect::new(0.0, 0.0, 100.0, 20.0),
            &config,
            Arc::new(RotationTable::new(4)),
            StdRng::seed_from_u64(3),
        )
        .unwrap();

        for individual in ga.population() {
            let angle = individual.rotation[0];
            assert!(angle == 0.0 || angle == 180.0, "angle {}", angle);
        }
    }

    #[test]
    fn test_generation_step_keeps_elite() {
        let config = NestConfig::new().with_population_size(6).with_mutation_rate(30);
        let mut ga = search(6, &config, 11);

        for i in 0..6 {
            let index = ga.next_individual();
            assert_eq!(index, i);
            ga.set_fitness(index, 10.0 - i as f64);
        }
        let best = ga.best().cloned().unwrap();
        assert_eq!(best.fitness, Some(5.0));

        let next = ga.next_individual();
        assert_eq!(ga.generation(), 1);
        assert_eq!(next, 1);
        assert_eq!(ga.population()[0], best);
        for individual in ga.population() {
            assert_permutation(individual, 6);
        }
    }

    #[test]
    fn test_crossover_is_permutation() {
        let nodes = nodes(5);
        let a = Phenotype::new(vec![0, 1, 2, 3, 4], vec![0.0; 5]);
        let b = Phenotype::new(vec![4, 3, 2, 1, 0], vec![90.0; 5]);
        let child = crossover(&nodes, &a, &b, 2);

        assert_eq!(child.placement, vec![0, 1, 4, 3, 2]);
        assert_eq!(child.rotation, vec![0.0, 0.0, 90.0, 90.0, 90.0]);
    }

    #[test]
    fn test_zero_mutation_rate_copies() {
        let config = NestConfig::new().with_population_size(4).with_mutation_rate(0);
        let ga = search(5, &config, 5);
        let adam = &ga.population()[0];
        for individual in ga.population() {
            assert_eq!(individual.placement, adam.placement);
        }
    }

    #[test]
    fn test_rejects_empty_population() {
        let config = NestConfig::new().with_population_size(0);
        let result = GeneticSearch::init_with_rng(
            nodes(2),
            BoundRect::new(0.0, 0.0, 10.0, 10.0),
            &config,
            Arc::new(RotationTable::new(1)),
            StdRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
