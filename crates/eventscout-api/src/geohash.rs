// Geohash encoding - Ticketmaster wants a geohash, not raw lat/lon
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Precision Ticketmaster is happy with (~38m x 19m cells)
pub const DEFAULT_PRECISION: usize = 8;

/// Encode a coordinate pair as a geohash of `precision` characters.
///
/// Bits alternate between longitude and latitude, longitude first, each one
/// halving the remaining interval. Out-of-range inputs are clamped.
pub fn encode(lat: f64, lon: f64, precision: usize) -> String {
    let lat = lat.clamp(-90.0, 90.0);
    let lon = lon.clamp(-180.0, 180.0);

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lon_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut even_bit = true;
    let mut bit = 0;
    let mut ch = 0usize;

    while hash.len() < precision {
        let (range, value) = if even_bit {
            (&mut lon_range, lon)
        } else {
            (&mut lat_range, lat)
        };

        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            ch = (ch << 1) | 1;
            range.0 = mid;
        } else {
            ch <<= 1;
            range.1 = mid;
        }

        even_bit = !even_bit;
        bit += 1;
        if bit == 5 {
            hash.push(BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hashes() {
        assert_eq!(encode(57.64911, 10.40744, 11), "u4pruydqqvj");
        assert_eq!(encode(42.6, -5.6, 5), "ezs42");
    }

    #[test]
    fn test_default_precision_is_prefix() {
        let long = encode(57.64911, 10.40744, 11);
        let short = encode(57.64911, 10.40744, DEFAULT_PRECISION);
        assert_eq!(short.len(), 8);
        assert!(long.starts_with(&short));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(encode(120.0, 500.0, 4), encode(90.0, 180.0, 4));
    }
}
