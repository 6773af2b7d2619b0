//! CPF (Cadastro de Pessoas Físicas) helpers.
//!
//! A CPF is eleven digits, the last two being mod-11 check digits over the
//! preceding ones. Punctuation (`529.982.247-25`) is accepted on input and
//! stripped before storage.

pub const CPF_LEN: usize = 11;

/// Keeps only ASCII digits.
pub fn normalize(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight = digits.len() as u32 + 1;
    let total: u32 = digits
        .iter()
        .enumerate()
        .map(|(idx, d)| d * (weight - idx as u32))
        .sum();

    match total % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Both check digits for a nine-digit prefix.
pub fn check_digits(prefix: &[u32; 9]) -> (u32, u32) {
    let first = check_digit(prefix);
    let mut extended = prefix.to_vec();
    extended.push(first);
    (first, check_digit(&extended))
}

pub fn validate(input: &str) -> bool {
    let digits: Vec<u32> = normalize(input)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != CPF_LEN || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let mut prefix = [0u32; 9];
    prefix.copy_from_slice(&digits[..9]);
    let (first, second) = check_digits(&prefix);

    digits[9] == first && digits[10] == second
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_valid_numbers() {
        assert!(validate("523.116.878-59"));
        assert!(validate("529.982.247-25"));
        assert!(validate("52998224725"));
        assert!(validate("539.529.150-41"));
    }

    #[test]
    fn known_invalid_numbers() {
        assert!(!validate("123.456.789-10"));
        assert!(!validate("529.982.247-26"));
        assert!(!validate("529.982.247-35"));
    }

    #[test]
    fn repeated_digits_are_rejected() {
        for d in 0..=9 {
            let cpf = d.to_string().repeat(CPF_LEN);
            assert!(!validate(&cpf), "{cpf} should be rejected");
        }
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        assert!(!validate(""));
        assert!(!validate("5299822472"));
        assert!(!validate("529982247250"));
        assert!(!validate("abc.def.ghi-jk"));
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("529.982.247-25"), "52998224725");
        assert_eq!(normalize(" 529 982 247 25 "), "52998224725");
    }

    #[test]
    fn computed_digits_always_validate() {
        // walk a spread of prefixes instead of a fixed table
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let mut prefix = [0u32; 9];
            for (i, slot) in prefix.iter_mut().enumerate() {
                *slot = ((seed >> (i * 5)) % 10) as u32;
            }
            let (first, second) = check_digits(&prefix);
            let mut cpf: String = prefix.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            cpf.push(char::from_digit(first, 10).unwrap());
            cpf.push(char::from_digit(second, 10).unwrap());

            let repeated = cpf.chars().all(|c| c == cpf.as_bytes()[0] as char);
            assert_eq!(validate(&cpf), !repeated, "{cpf}");

            let wrong = (second + 1) % 10;
            let mut tampered = cpf[..10].to_string();
            tampered.push(char::from_digit(wrong, 10).unwrap());
            assert!(!validate(&tampered), "{tampered}");
        }
    }
}
