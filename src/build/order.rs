use super::BuildError;
use crate::language::{Language, LanguageId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Orders `languages` so that every language comes after the languages it
/// depends on. Dependencies outside the given set are ignored. Independent
/// languages come out in id order, so the same input always yields the same
/// sequence.
pub fn build_order(languages: &[Arc<dyn Language>]) -> Result<Vec<Arc<dyn Language>>, BuildError> {
    let by_id: BTreeMap<LanguageId, Arc<dyn Language>> = languages
        .iter()
        .map(|l| (l.id().clone(), Arc::clone(l)))
        .collect();

    let mut in_degree: BTreeMap<&LanguageId, usize> = by_id.keys().map(|id| (id, 0)).collect();
    let mut dependents: BTreeMap<&LanguageId, Vec<&LanguageId>> = BTreeMap::new();

    for (id, language) in &by_id {
        let deps: BTreeSet<&LanguageId> = language
            .dependencies()
            .iter()
            .filter(|dep| by_id.contains_key(*dep) && *dep != id)
            .collect();
        for dep in deps {
            if let Some(degree) = in_degree.get_mut(id) {
                *degree += 1;
            }
            dependents.entry(dep).or_default().push(id);
        }
    }

    let mut ready: BTreeSet<&LanguageId> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut result = Vec::with_capacity(by_id.len());
    while let Some(id) = ready.pop_first() {
        result.push(Arc::clone(&by_id[id]));

        for dependent in dependents.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    if result.len() < by_id.len() {
        let languages = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id.clone())
            .collect();
        return Err(BuildError::DependencyCycle { languages });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::MockLanguage;

    fn id(name: &str) -> LanguageId {
        LanguageId::new("org.example", name, "1.0.0")
    }

    fn lang(name: &str, deps: &[&str]) -> Arc<dyn Language> {
        let mut language = MockLanguage::new(name, name);
        for dep in deps {
            language = language.depends_on(id(dep));
        }
        Arc::new(language)
    }

    fn names(order: &[Arc<dyn Language>]) -> Vec<&str> {
        order.iter().map(|l| l.name()).collect()
    }

    #[test]
    fn test_simple_linear_dependencies() {
        let order = build_order(&[lang("app", &["lib"]), lang("lib", &[])]).unwrap();
        assert_eq!(names(&order), vec!["lib", "app"]);
    }

    #[test]
    fn test_diamond_dependencies() {
        let order = build_order(&[
            lang("app", &["lib1", "lib2"]),
            lang("lib1", &["core"]),
            lang("lib2", &["core"]),
            lang("core", &[]),
        ])
        .unwrap();

        let position = |name: &str| order.iter().position(|l| l.name() == name).unwrap();
        assert_eq!(position("core"), 0);
        assert!(position("lib1") < position("app"));
        assert!(position("lib2") < position("app"));
        assert_eq!(position("app"), 3);
    }

    #[test]
    fn test_independent_languages_are_stable() {
        let input = [lang("zeta", &[]), lang("alpha", &[]), lang("mid", &[])];
        let first = build_order(&input).unwrap();
        let mut reversed = input.to_vec();
        reversed.reverse();
        let second = build_order(&reversed).unwrap();

        assert_eq!(names(&first), vec!["alpha", "mid", "zeta"]);
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_dependencies_outside_the_set_are_ignored() {
        let order = build_order(&[lang("app", &["not-built"])]).unwrap();
        assert_eq!(names(&order), vec!["app"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let err = build_order(&[
            lang("a", &["b"]),
            lang("b", &["a"]),
            lang("c", &[]),
        ])
        .err()
        .unwrap();

        match err {
            BuildError::DependencyCycle { languages } => {
                assert_eq!(languages, vec![id("a"), id("b")]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(build_order(&[]).unwrap().is_empty());
    }
}
