use std::sync::Arc;

use rand::{Rng, rngs::OsRng};
use tracing::debug;

use super::{Age, Gender};
use crate::errors::{BoothError, Result};

/// Subject phrases indexed as `matrix[gender][age]`.
pub type CharacterMatrix = [[&'static str; 3]; 3];

/// Maps a (gender, age) selection to a phrase describing the subject.
pub trait Composer: Send + Sync {
    fn compose(&self, gender: Gender, age: Age) -> String;
}

pub struct MatrixComposer {
    matrix: CharacterMatrix,
}

impl MatrixComposer {
    pub const fn new(matrix: CharacterMatrix) -> Self {
        Self { matrix }
    }
}

impl Composer for MatrixComposer {
    fn compose(&self, gender: Gender, age: Age) -> String {
        let phrase = self.matrix[gender.index()][age.index()];
        debug!(target: "character", %gender, %age, phrase, "character selected");
        phrase.to_string()
    }
}

/// Source of uniformly distributed indices in `[0, len)`.
pub trait IndexSource: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

/// Draws from the operating system CSPRNG, so selections are neither
/// predictable nor replayable from a seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsIndexSource;

impl IndexSource for OsIndexSource {
    fn pick(&self, len: usize) -> usize {
        OsRng.gen_range(0..len)
    }
}

/// Delegates every call to one of its members, chosen afresh each time.
pub struct RandomComposer {
    members: Vec<Arc<dyn Composer>>,
    source: Arc<dyn IndexSource>,
}

impl RandomComposer {
    pub fn new(members: Vec<Arc<dyn Composer>>, source: Arc<dyn IndexSource>) -> Result<Self> {
        if members.is_empty() {
            return Err(BoothError::invalid(
                "random composer needs at least one member",
            ));
        }
        Ok(Self { members, source })
    }
}

impl Composer for RandomComposer {
    fn compose(&self, gender: Gender, age: Age) -> String {
        let len = self.members.len();
        let index = self.source.pick(len) % len;
        debug!(target: "character", index, of = len, "random composer draw");
        self.members[index].compose(gender, age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PERSONS: CharacterMatrix = [
        ["young girl", "woman", "old woman"],
        ["young person", "person", "old person"],
        ["young boy", "man", "old man"],
    ];

    struct Cycle(AtomicUsize);

    impl IndexSource for Cycle {
        fn pick(&self, len: usize) -> usize {
            self.0.fetch_add(1, Ordering::Relaxed) % len
        }
    }

    struct Fixed(&'static str);

    impl Composer for Fixed {
        fn compose(&self, _gender: Gender, _age: Age) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn matrix_lookup_returns_the_indexed_cell() {
        let composer = MatrixComposer::new(PERSONS);
        assert_eq!(composer.compose(Gender::Female, Age::Young), "young girl");
        assert_eq!(composer.compose(Gender::Male, Age::Old), "old man");

        for gender in Gender::ALL {
            for age in Age::ALL {
                assert_eq!(
                    composer.compose(gender, age),
                    PERSONS[gender.index()][age.index()]
                );
            }
        }
    }

    #[test]
    fn random_composer_delegates_to_the_drawn_member() {
        let members: Vec<Arc<dyn Composer>> =
            vec![Arc::new(Fixed("a")), Arc::new(Fixed("b")), Arc::new(Fixed("c"))];
        let composer = RandomComposer::new(members, Arc::new(Cycle(AtomicUsize::new(0)))).unwrap();

        let drawn: Vec<_> = (0..4)
            .map(|_| composer.compose(Gender::Person, Age::Middle))
            .collect();
        assert_eq!(drawn, ["a", "b", "c", "a"]);
    }

    #[test]
    fn random_composer_tolerates_an_out_of_range_source() {
        struct Wild;
        impl IndexSource for Wild {
            fn pick(&self, _len: usize) -> usize {
                usize::MAX
            }
        }

        let members: Vec<Arc<dyn Composer>> = vec![Arc::new(Fixed("a")), Arc::new(Fixed("b"))];
        let composer = RandomComposer::new(members, Arc::new(Wild)).unwrap();
        let phrase = composer.compose(Gender::Male, Age::Young);
        assert!(phrase == "a" || phrase == "b");
    }

    #[test]
    fn random_composer_requires_members() {
        let err = RandomComposer::new(Vec::new(), Arc::new(OsIndexSource))
            .err()
            .unwrap();
        assert!(matches!(err, BoothError::InvalidArgument(_)));
    }

    #[test]
    fn os_source_stays_in_range() {
        for _ in 0..500 {
            assert!(OsIndexSource.pick(5) < 5);
        }
    }
}
