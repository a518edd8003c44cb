use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use viradyn::{Host, Resistances, ResistantVirus, SimpleVirus, TreatedHost};

fn resistances(traits: &[(&str, bool)]) -> Resistances {
    traits
        .iter()
        .map(|&(drug, resistant)| (drug.to_string(), resistant))
        .collect()
}

#[test]
fn unbounded_growth_without_clearance() {
    let virus = SimpleVirus::new(1.0, 0.0).expect("failed to construct virus");
    let mut host = Host::with_rng(vec![virus; 100], 1000, ChaCha12Rng::seed_from_u64(0));

    let n_viruses = host.update();

    // Density 0.1 gives each particle a 0.9 birth chance.
    assert!(n_viruses >= 100);
    assert!(n_viruses <= 200);
    assert!(n_viruses > 150, "population only grew to {n_viruses}");
}

#[test]
fn prescription_halts_reproduction_of_susceptible_population() {
    let virus = ResistantVirus::new(0.5, 0.1, resistances(&[("drugX", false)]), 0.5)
        .expect("failed to construct virus");
    let mut host = TreatedHost::with_rng(vec![virus; 500], 1000, ChaCha12Rng::seed_from_u64(1));

    // Mutations before treatment may produce resistant particles.
    host.update();
    assert!(host.add_prescription("drugX"));

    let mut n_prev = host.total_population();
    let mut n_resistant_prev = host.resistant_population_count(&["drugX"]);
    for _ in 0..20 {
        let n_viruses = host.update();
        let n_resistant = host.resistant_population_count(&["drugX"]);
        let n_susceptible = n_viruses - n_resistant;
        let n_susceptible_prev = n_prev - n_resistant_prev;

        // Only resistant parents reproduce; their offspring may lose resistance.
        assert!(n_viruses <= n_prev + n_resistant_prev);
        assert!(n_susceptible <= n_susceptible_prev + n_resistant_prev);

        n_prev = n_viruses;
        n_resistant_prev = n_resistant;
    }
}

#[test]
fn non_resistant_population_only_shrinks_under_treatment() {
    let virus = ResistantVirus::new(1.0, 0.2, resistances(&[("drugX", false)]), 0.0)
        .expect("failed to construct virus");
    let mut host = TreatedHost::with_rng(vec![virus; 200], 1000, ChaCha12Rng::seed_from_u64(2));
    host.add_prescription("drugX");

    let mut n_prev = host.total_population();
    for _ in 0..30 {
        let n_viruses = host.update();
        assert!(n_viruses <= n_prev);
        n_prev = n_viruses;
    }
    assert!(n_prev < 200);
    assert_eq!(host.resistant_population_count(&["drugX"]), 0);
}

#[test]
fn empty_drug_list_counts_whole_population() {
    let virus = ResistantVirus::new(0.3, 0.1, resistances(&[("a", true), ("b", false)]), 0.05)
        .expect("failed to construct virus");
    let mut host = TreatedHost::with_rng(vec![virus; 100], 500, ChaCha12Rng::seed_from_u64(3));
    for _ in 0..25 {
        let n_viruses = host.update();
        assert_eq!(host.resistant_population_count::<&str>(&[]), n_viruses);
    }
}

#[test]
fn extinct_host_stays_empty() {
    let virus = SimpleVirus::new(0.5, 1.0).expect("failed to construct virus");
    let mut host = Host::with_rng(vec![virus; 10], 100, ChaCha12Rng::seed_from_u64(4));
    for _ in 0..5 {
        assert_eq!(host.update(), 0);
    }
}

#[test]
fn identical_seeds_give_identical_treated_trajectories() {
    let run = || {
        let virus = ResistantVirus::new(0.1, 0.05, resistances(&[("guttagonol", false)]), 0.005)
            .expect("failed to construct virus");
        let mut host =
            TreatedHost::with_rng(vec![virus; 100], 1000, ChaCha12Rng::seed_from_u64(5));
        let mut series = Vec::new();
        for step in 0..300 {
            if step == 150 {
                host.add_prescription("guttagonol");
            }
            series.push((host.update(), host.resistant_population_count(&["guttagonol"])));
        }
        series
    };
    assert_eq!(run(), run());
}
