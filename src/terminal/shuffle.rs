use crate::models::QuestionRecord;
use rand::Rng;
use rand::seq::SliceRandom;

/// Copy of `question` with its options reordered.
pub fn shuffle_answers<R: Rng + ?Sized>(question: &QuestionRecord, rng: &mut R) -> QuestionRecord {
    let mut shuffled = question.clone();
    if let Some(options) = shuffled.options.as_mut() {
        options.shuffle(rng);
    }
    shuffled
}
