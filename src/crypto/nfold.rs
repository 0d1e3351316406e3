//! The RFC 3961 section 5.1 n-fold operation.

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Rotate the whole input right by `bits`, treating it as one big-endian bit string.
fn rotate_right(input: &[u8], bits: usize) -> Vec<u8> {
    let nbits = input.len() * 8;
    let shift = bits % nbits;
    let mut out = vec![0u8; input.len()];
    for j in 0..nbits {
        let src = (j + nbits - shift) % nbits;
        if input[src / 8] & (0x80 >> (src % 8)) != 0 {
            out[j / 8] |= 0x80 >> (j % 8);
        }
    }
    out
}

/// One's complement addition of `chunk` into `acc`, both big-endian.
fn ones_complement_add(acc: &mut [u8], chunk: &[u8]) {
    let mut carry = 0u16;
    for (a, c) in acc.iter_mut().zip(chunk).rev() {
        let sum = u16::from(*a) + u16::from(*c) + carry;
        *a = (sum & 0xff) as u8;
        carry = sum >> 8;
    }
    // End-around carry.
    while carry != 0 {
        for a in acc.iter_mut().rev() {
            let sum = u16::from(*a) + carry;
            *a = (sum & 0xff) as u8;
            carry = sum >> 8;
            if carry == 0 {
                break;
            }
        }
    }
}

/// Stretch or shrink `input` to `out_len` bytes. Copies of the input, each rotated a
/// further 13 bits, are laid end to end up to lcm(input, output) bytes and then
/// summed in output-sized chunks.
pub(crate) fn nfold(input: &[u8], out_len: usize) -> Vec<u8> {
    let mut acc = vec![0u8; out_len];
    if input.is_empty() || out_len == 0 {
        return acc;
    }

    let lcm = input.len() / gcd(input.len(), out_len) * out_len;
    let copies = lcm / input.len();

    let mut expanded = Vec::with_capacity(lcm);
    for i in 0..copies {
        expanded.extend(rotate_right(input, 13 * i));
    }

    for chunk in expanded.chunks(out_len) {
        ones_complement_add(&mut acc, chunk);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::nfold;
    use assert_hex::assert_eq_hex;

    // https://www.rfc-editor.org/rfc/rfc3961#appendix-A.1
    #[test]
    fn nfold_rfc3961_vectors() {
        let vectors: [(&[u8], usize, &str); 5] = [
            (b"012345", 8, "be072631276b1955"),
            (b"password", 7, "78a07b6caf85fa"),
            (
                b"Rough Consensus, and Running Code",
                8,
                "bb6ed30870b7f0e0",
            ),
            (
                b"password",
                21,
                "59e4a8ca7c0385c3c37b3f6d2000247cb6e6bd5b3e",
            ),
            (b"kerberos", 16, "6b65726265726f737b9b5b2b93132b93"),
        ];

        for (input, out_len, expected) in vectors {
            let expected = hex::decode(expected).expect("Failed to decode vector");
            assert_eq_hex!(nfold(input, out_len), expected);
        }
    }
}
