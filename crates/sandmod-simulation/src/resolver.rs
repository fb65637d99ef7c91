//! Reaction resolver - picks the outcome for a cell pair or a single cell

use crate::element::ElementId;
use crate::rng::SimRng;
use crate::rules::RuleSet;

impl RuleSet {
    /// Try to react `left` (the actor) with its neighbor `right`
    ///
    /// Candidates are tried in source order with one draw each; the first
    /// draw below the rule's probability fires. Returns the new
    /// `(left, right)` pair, or `None` if nothing fired. `Empty` never
    /// initiates and consumes no randomness.
    pub fn try_react<R: SimRng + ?Sized>(
        &self,
        left: ElementId,
        right: ElementId,
        rng: &mut R,
    ) -> Option<(ElementId, ElementId)> {
        if left.is_empty() {
            return None;
        }

        self.reactions_for(left, right)
            .iter()
            .find(|rule| rng.check_probability(rule.probability))
            .map(|rule| (rule.out_left, rule.out_right))
    }

    /// Try the self transitions of `element`, same policy as [`try_react`]
    ///
    /// [`try_react`]: RuleSet::try_react
    pub fn try_self<R: SimRng + ?Sized>(&self, element: ElementId, rng: &mut R) -> Option<ElementId> {
        if element.is_empty() {
            return None;
        }

        self.self_rules_for(element)
            .iter()
            .find(|rule| rng.check_probability(rule.probability))
            .map(|rule| rule.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::declarations::{Declarations, Statement};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    /// Replays a fixed sequence of draws and counts how many were taken
    struct ScriptedRng {
        draws: Vec<f32>,
        taken: usize,
    }

    impl ScriptedRng {
        fn new(draws: &[f32]) -> Self {
            Self {
                draws: draws.to_vec(),
                taken: 0,
            }
        }
    }

    impl SimRng for ScriptedRng {
        fn gen_bool(&mut self) -> bool {
            self.gen_f32() < 0.5
        }

        fn gen_f32(&mut self) -> f32 {
            let value = self.draws[self.taken % self.draws.len()];
            self.taken += 1;
            value
        }

        fn gen_index(&mut self, len: usize) -> usize {
            (self.gen_f32() * len as f32) as usize
        }
    }

    fn quench_rules() -> RuleSet {
        let decls = Declarations::new()
            .with(Statement::element("Water", "#0000FF"))
            .with(Statement::element("Steam", "#E0E0E0"))
            .with(Statement::element("Fire1", "#FFDF00"))
            .with(Statement::reaction(0.1, "Water", "Fire1", "Steam", "Fire1"))
            .with(Statement::reaction(0.4, "Water", "Fire1", "Steam", "Empty"))
            .with(Statement::reaction(0.5, "Water", "Fire1", "Water", "Empty"))
            .with(Statement::self_transition(0.2, "Fire1", "Empty"));
        compile(&decls).unwrap()
    }

    #[test]
    fn test_first_success_wins_in_source_order() {
        let rules = quench_rules();
        let water = rules.elements().id_of("Water").unwrap();
        let steam = rules.elements().id_of("Steam").unwrap();
        let fire = rules.elements().id_of("Fire1").unwrap();

        // 0.5 fails the 0.1 rule, 0.3 passes the 0.4 rule
        let mut rng = ScriptedRng::new(&[0.5, 0.3, 0.0]);
        assert_eq!(
            rules.try_react(water, fire, &mut rng),
            Some((steam, ElementId::EMPTY))
        );
        assert_eq!(rng.taken, 2);

        // Every candidate fails: one draw each
        let mut rng = ScriptedRng::new(&[0.99]);
        assert_eq!(rules.try_react(water, fire, &mut rng), None);
        assert_eq!(rng.taken, 3);
    }

    #[test]
    fn test_no_candidates_no_draws() {
        let rules = quench_rules();
        let water = rules.elements().id_of("Water").unwrap();
        let fire = rules.elements().id_of("Fire1").unwrap();

        let mut rng = ScriptedRng::new(&[0.0]);
        assert_eq!(rules.try_react(fire, water, &mut rng), None);
        assert_eq!(rules.try_react(ElementId::EMPTY, water, &mut rng), None);
        assert_eq!(rules.try_self(ElementId::EMPTY, &mut rng), None);
        assert_eq!(rules.try_self(water, &mut rng), None);
        assert_eq!(rng.taken, 0);
    }

    #[test]
    fn test_same_rng_state_same_result() {
        let rules = quench_rules();
        let water = rules.elements().id_of("Water").unwrap();
        let fire = rules.elements().id_of("Fire1").unwrap();

        let mut a = Xoshiro256StarStar::seed_from_u64(99);
        let mut b = Xoshiro256StarStar::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(
                rules.try_react(water, fire, &mut a),
                rules.try_react(water, fire, &mut b)
            );
        }
    }

    #[test]
    fn test_self_transition_rate() {
        let rules = quench_rules();
        let fire = rules.elements().id_of("Fire1").unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(2024);

        let trials = 20_000;
        let fired = (0..trials)
            .filter(|_| rules.try_self(fire, &mut rng).is_some())
            .count();
        let rate = fired as f64 / trials as f64;
        assert!((rate - 0.2).abs() < 0.02, "rate was {rate}");
    }
}
