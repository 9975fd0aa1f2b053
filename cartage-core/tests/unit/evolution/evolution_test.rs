use super::*;
use crate::construction::heuristics::plan_greedy;
use crate::helpers::construction::{test_environment, PlanningSetup};
use crate::helpers::models::*;
use crate::models::solution::Stop;

fn stops_of(orders: &[crate::models::problem::Order]) -> Vec<Stop> {
    orders.iter().flat_map(|order| vec![Stop::pickup(order), Stop::delivery(order)]).collect()
}

fn test_orders() -> Vec<crate::models::problem::Order> {
    vec![
        test_order_between("order1", point_north(0.03), point_north(0.08)),
        test_order_between("order2", point_north(0.01), point_north(0.06)),
        test_order_between("order3", point_north(0.07), point_north(0.02)),
        test_order_between("order4", point_north(0.05), point_north(0.04)),
        test_order_between("order5", point_north(0.09), point_north(0.10)),
    ]
}

#[test]
fn can_find_sequence_not_worse_than_greedy() {
    let setup = PlanningSetup::default();
    let ctx = setup.context();
    let stops = stops_of(&test_orders());

    let greedy_cost = ctx.evaluate(&plan_greedy(&ctx, stops.clone()).expect("greedy must succeed")).cost;

    let (sequence, partial) = evolve_sequence(&ctx, stops, &EvolutionConfig::default(), &test_environment());

    assert!(!partial);
    assert!(ctx.evaluate(&sequence).cost <= greedy_cost + 1E-9);
}

#[test]
fn can_keep_precedence_in_evolved_sequence() {
    let setup = PlanningSetup::default();
    let ctx = setup.context();

    let (sequence, _) = evolve_sequence(&ctx, stops_of(&test_orders()), &EvolutionConfig::default(), &test_environment());

    let route = ctx.build_route(sequence);
    assert!(route.validate(&setup.vehicle.capacity).is_ok());
}

#[test]
fn can_repeat_search_with_same_seed() {
    let setup = PlanningSetup::default();
    let ctx = setup.context();
    let stops = stops_of(&test_orders());

    let (first, _) = evolve_sequence(&ctx, stops.clone(), &EvolutionConfig::default(), &test_environment());
    let (second, _) = evolve_sequence(&ctx, stops, &EvolutionConfig::default(), &test_environment());

    let ids = |sequence: &[Stop]| {
        sequence.iter().map(|stop| (stop.order_id.clone(), stop.kind)).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn can_build_config_with_builder() {
    let config = EvolutionConfigBuilder::default()
        .with_generations(10)
        .with_max_population(8)
        .with_mutation_rate(0.2)
        .with_tournament_size(2)
        .build()
        .expect("must be valid");

    assert_eq!(config.generations, 10);
    assert_eq!(config.max_population, 8);
    assert_eq!(config.tournament_size, 2);
}

parameterized_test! {can_reject_invalid_config, builder, {
    assert!(builder.build().is_err());
}}

can_reject_invalid_config! {
    case01_no_generations: EvolutionConfigBuilder::default().with_generations(0),
    case02_tiny_population: EvolutionConfigBuilder::default().with_max_population(1),
    case03_bad_mutation_rate: EvolutionConfigBuilder::default().with_mutation_rate(1.5),
    case04_empty_tournament: EvolutionConfigBuilder::default().with_tournament_size(0),
}
