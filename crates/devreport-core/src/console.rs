//! Operator interaction consumed by the probe sequences.

/// Questions the probe sequences put to the operator.
pub trait Console {
    /// A yes/no question. Implementations keep asking until they get an answer.
    fn confirm(&mut self, question: &str) -> bool;
    /// One line of free text, without its line terminator.
    fn prompt_line(&mut self, question: &str) -> String;
    /// Show `message` and block until the operator acknowledges it.
    fn wait_for_enter(&mut self, message: &str);
}

impl<C: Console + ?Sized> Console for &mut C {
    fn confirm(&mut self, question: &str) -> bool {
        (**self).confirm(question)
    }

    fn prompt_line(&mut self, question: &str) -> String {
        (**self).prompt_line(question)
    }

    fn wait_for_enter(&mut self, message: &str) {
        (**self).wait_for_enter(message)
    }
}

/// Parse a yes/no answer. `None` asks for the question to be repeated.
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().chars().next()? {
        'y' | 'Y' => Some(true),
        'n' | 'N' => Some(false),
        _ => None,
    }
}
