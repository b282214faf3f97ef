use crate::domain::models::SessionCode;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Supplies candidate session codes; the registry retries on collision.
#[cfg_attr(test, mockall::automock)]
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> SessionCode;
}

/// Uniformly random codes over `[0-9A-Z]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomCodes {
    length: usize,
}

impl RandomCodes {
    pub fn new(length: usize) -> Self {
        RandomCodes {
            length: length.max(1),
        }
    }
}

impl Default for RandomCodes {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeSource for RandomCodes {
    fn next_code(&self) -> SessionCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        SessionCode::parse(&code)
    }
}

impl<F> CodeSource for F
where
    F: Fn() -> SessionCode + Send + Sync,
{
    fn next_code(&self) -> SessionCode {
        self()
    }
}
