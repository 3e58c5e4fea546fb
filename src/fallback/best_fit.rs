use super::{EncoderFallback, EncoderFallbackBuffer, StagedUnits, delegate_cursor};
use crate::Result;

/// Latin-1 encoder fallback that maps look-alike characters to ASCII
///
/// Accented Latin letters outside Latin-1 lose their diacritics, typographic
/// punctuation becomes its plain counterpart and full-width forms become
/// their ASCII originals. Anything else, including every supplementary
/// scalar, becomes a single `?`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestFitFallback;

impl BestFitFallback {
    /// Best-fit byte for `unit`, if the table has one
    pub fn lookup(unit: u16) -> Option<u8> {
        BEST_FIT
            .binary_search_by_key(&unit, |&(source, _)| source)
            .ok()
            .map(|i| BEST_FIT[i].1)
    }
}

impl EncoderFallback for BestFitFallback {
    fn max_unit_count(&self) -> usize {
        1
    }

    fn create_buffer(&self) -> Box<dyn EncoderFallbackBuffer> {
        Box::new(BestFitBuffer::default())
    }
}

#[derive(Debug, Clone, Default)]
struct BestFitBuffer {
    staged: StagedUnits,
}

impl EncoderFallbackBuffer for BestFitBuffer {
    fn fallback(&mut self, unit: u16, _index: usize) -> Result<bool> {
        let byte = BestFitFallback::lookup(unit).unwrap_or(b'?');
        self.staged.stage(&[u16::from(byte)])
    }

    fn fallback_pair(&mut self, _high: u16, _low: u16, _index: usize) -> Result<bool> {
        self.staged.stage(&[u16::from(b'?')])
    }

    delegate_cursor!(EncoderFallbackBuffer);
}

/// `(source unit, replacement byte)`, sorted by source unit
static BEST_FIT: &[(u16, u8)] = &[
    (0x0100, 0x41), (0x0101, 0x61), (0x0102, 0x41), (0x0103, 0x61), (0x0104, 0x41),
    (0x0105, 0x61), (0x0106, 0x43), (0x0107, 0x63), (0x0108, 0x43), (0x0109, 0x63),
    (0x010A, 0x43), (0x010B, 0x63), (0x010C, 0x43), (0x010D, 0x63), (0x010E, 0x44),
    (0x010F, 0x64), (0x0110, 0x44), (0x0111, 0x64), (0x0112, 0x45), (0x0113, 0x65),
    (0x0114, 0x45), (0x0115, 0x65), (0x0116, 0x45), (0x0117, 0x65), (0x0118, 0x45),
    (0x0119, 0x65), (0x011A, 0x45), (0x011B, 0x65), (0x011C, 0x47), (0x011D, 0x67),
    (0x011E, 0x47), (0x011F, 0x67), (0x0120, 0x47), (0x0121, 0x67), (0x0122, 0x47),
    (0x0123, 0x67), (0x0124, 0x48), (0x0125, 0x68), (0x0126, 0x48), (0x0127, 0x68),
    (0x0128, 0x49), (0x0129, 0x69), (0x012A, 0x49), (0x012B, 0x69), (0x012C, 0x49),
    (0x012D, 0x69), (0x012E, 0x49), (0x012F, 0x69), (0x0130, 0x49), (0x0131, 0x69),
    (0x0134, 0x4A), (0x0135, 0x6A), (0x0136, 0x4B), (0x0137, 0x6B), (0x0139, 0x4C),
    (0x013A, 0x6C), (0x013B, 0x4C), (0x013C, 0x6C), (0x013D, 0x4C), (0x013E, 0x6C),
    (0x0141, 0x4C), (0x0142, 0x6C), (0x0143, 0x4E), (0x0144, 0x6E), (0x0145, 0x4E),
    (0x0146, 0x6E), (0x0147, 0x4E), (0x0148, 0x6E), (0x014C, 0x4F), (0x014D, 0x6F),
    (0x014E, 0x4F), (0x014F, 0x6F), (0x0150, 0x4F), (0x0151, 0x6F), (0x0152, 0x4F),
    (0x0153, 0x6F), (0x0154, 0x52), (0x0155, 0x72), (0x0156, 0x52), (0x0157, 0x72),
    (0x0158, 0x52), (0x0159, 0x72), (0x015A, 0x53), (0x015B, 0x73), (0x015C, 0x53),
    (0x015D, 0x73), (0x015E, 0x53), (0x015F, 0x73), (0x0160, 0x53), (0x0161, 0x73),
    (0x0162, 0x54), (0x0163, 0x74), (0x0164, 0x54), (0x0165, 0x74), (0x0166, 0x54),
    (0x0167, 0x74), (0x0168, 0x55), (0x0169, 0x75), (0x016A, 0x55), (0x016B, 0x75),
    (0x016C, 0x55), (0x016D, 0x75), (0x016E, 0x55), (0x016F, 0x75), (0x0170, 0x55),
    (0x0171, 0x75), (0x0172, 0x55), (0x0173, 0x75), (0x0174, 0x57), (0x0175, 0x77),
    (0x0176, 0x59), (0x0177, 0x79), (0x0178, 0x59), (0x0179, 0x5A), (0x017A, 0x7A),
    (0x017B, 0x5A), (0x017C, 0x7A), (0x017D, 0x5A), (0x017E, 0x7A), (0x0180, 0x62),
    (0x0197, 0x49), (0x019A, 0x6C), (0x01A0, 0x4F), (0x01A1, 0x6F), (0x01AF, 0x55),
    (0x01B0, 0x75), (0x01B5, 0x5A), (0x01B6, 0x7A), (0x01CD, 0x41), (0x01CE, 0x61),
    (0x01CF, 0x49), (0x01D0, 0x69), (0x01D1, 0x4F), (0x01D2, 0x6F), (0x01D3, 0x55),
    (0x01D4, 0x75), (0x01D5, 0x55), (0x01D6, 0x75), (0x01D7, 0x55), (0x01D8, 0x75),
    (0x01D9, 0x55), (0x01DA, 0x75), (0x01DB, 0x55), (0x01DC, 0x75), (0x01DE, 0x41),
    (0x01DF, 0x61), (0x01E0, 0x41), (0x01E1, 0x61), (0x01E4, 0x47), (0x01E5, 0x67),
    (0x01E6, 0x47), (0x01E7, 0x67), (0x01E8, 0x4B), (0x01E9, 0x6B), (0x01EA, 0x4F),
    (0x01EB, 0x6F), (0x01EC, 0x4F), (0x01ED, 0x6F), (0x01F0, 0x6A), (0x01F4, 0x47),
    (0x01F5, 0x67), (0x01F8, 0x4E), (0x01F9, 0x6E), (0x01FA, 0x41), (0x01FB, 0x61),
    (0x0200, 0x41), (0x0201, 0x61), (0x0202, 0x41), (0x0203, 0x61), (0x0204, 0x45),
    (0x0205, 0x65), (0x0206, 0x45), (0x0207, 0x65), (0x0208, 0x49), (0x0209, 0x69),
    (0x020A, 0x49), (0x020B, 0x69), (0x020C, 0x4F), (0x020D, 0x6F), (0x020E, 0x4F),
    (0x020F, 0x6F), (0x0210, 0x52), (0x0211, 0x72), (0x0212, 0x52), (0x0213, 0x72),
    (0x0214, 0x55), (0x0215, 0x75), (0x0216, 0x55), (0x0217, 0x75), (0x0218, 0x53),
    (0x0219, 0x73), (0x021A, 0x54), (0x021B, 0x74), (0x021E, 0x48), (0x021F, 0x68),
    (0x0226, 0x41), (0x0227, 0x61), (0x0228, 0x45), (0x0229, 0x65), (0x022A, 0x4F),
    (0x022B, 0x6F), (0x022C, 0x4F), (0x022D, 0x6F), (0x022E, 0x4F), (0x022F, 0x6F),
    (0x0230, 0x4F), (0x0231, 0x6F), (0x0232, 0x59), (0x0233, 0x79), (0x02C6, 0x5E),
    (0x02C8, 0x27), (0x02CB, 0x60), (0x02CD, 0x5F), (0x02DC, 0x7E), (0x1E00, 0x41),
    (0x1E01, 0x61), (0x1E02, 0x42), (0x1E03, 0x62), (0x1E04, 0x42), (0x1E05, 0x62),
    (0x1E06, 0x42), (0x1E07, 0x62), (0x1E08, 0x43), (0x1E09, 0x63), (0x1E0A, 0x44),
    (0x1E0B, 0x64), (0x1E0C, 0x44), (0x1E0D, 0x64), (0x1E0E, 0x44), (0x1E0F, 0x64),
    (0x1E10, 0x44), (0x1E11, 0x64), (0x1E12, 0x44), (0x1E13, 0x64), (0x1E14, 0x45),
    (0x1E15, 0x65), (0x1E16, 0x45), (0x1E17, 0x65), (0x1E18, 0x45), (0x1E19, 0x65),
    (0x1E1A, 0x45), (0x1E1B, 0x65), (0x1E1C, 0x45), (0x1E1D, 0x65), (0x1E1E, 0x46),
    (0x1E1F, 0x66), (0x1E20, 0x47), (0x1E21, 0x67), (0x1E22, 0x48), (0x1E23, 0x68),
    (0x1E24, 0x48), (0x1E25, 0x68), (0x1E26, 0x48), (0x1E27, 0x68), (0x1E28, 0x48),
    (0x1E29, 0x68), (0x1E2A, 0x48), (0x1E2B, 0x68), (0x1E2C, 0x49), (0x1E2D, 0x69),
    (0x1E2E, 0x49), (0x1E2F, 0x69), (0x1E30, 0x4B), (0x1E31, 0x6B), (0x1E32, 0x4B),
    (0x1E33, 0x6B), (0x1E34, 0x4B), (0x1E35, 0x6B), (0x1E36, 0x4C), (0x1E37, 0x6C),
    (0x1E38, 0x4C), (0x1E39, 0x6C), (0x1E3A, 0x4C), (0x1E3B, 0x6C), (0x1E3C, 0x4C),
    (0x1E3D, 0x6C), (0x1E3E, 0x4D), (0x1E3F, 0x6D), (0x1E40, 0x4D), (0x1E41, 0x6D),
    (0x1E42, 0x4D), (0x1E43, 0x6D), (0x1E44, 0x4E), (0x1E45, 0x6E), (0x1E46, 0x4E),
    (0x1E47, 0x6E), (0x1E48, 0x4E), (0x1E49, 0x6E), (0x1E4A, 0x4E), (0x1E4B, 0x6E),
    (0x1E4C, 0x4F), (0x1E4D, 0x6F), (0x1E4E, 0x4F), (0x1E4F, 0x6F), (0x1E50, 0x4F),
    (0x1E51, 0x6F), (0x1E52, 0x4F), (0x1E53, 0x6F), (0x1E54, 0x50), (0x1E55, 0x70),
    (0x1E56, 0x50), (0x1E57, 0x70), (0x1E58, 0x52), (0x1E59, 0x72), (0x1E5A, 0x52),
    (0x1E5B, 0x72), (0x1E5C, 0x52), (0x1E5D, 0x72), (0x1E5E, 0x52), (0x1E5F, 0x72),
    (0x1E60, 0x53), (0x1E61, 0x73), (0x1E62, 0x53), (0x1E63, 0x73), (0x1E64, 0x53),
    (0x1E65, 0x73), (0x1E66, 0x53), (0x1E67, 0x73), (0x1E68, 0x53), (0x1E69, 0x73),
    (0x1E6A, 0x54), (0x1E6B, 0x74), (0x1E6C, 0x54), (0x1E6D, 0x74), (0x1E6E, 0x54),
    (0x1E6F, 0x74), (0x1E70, 0x54), (0x1E71, 0x74), (0x1E72, 0x55), (0x1E73, 0x75),
    (0x1E74, 0x55), (0x1E75, 0x75), (0x1E76, 0x55), (0x1E77, 0x75), (0x1E78, 0x55),
    (0x1E79, 0x75), (0x1E7A, 0x55), (0x1E7B, 0x75), (0x1E7C, 0x56), (0x1E7D, 0x76),
    (0x1E7E, 0x56), (0x1E7F, 0x76), (0x1E80, 0x57), (0x1E81, 0x77), (0x1E82, 0x57),
    (0x1E83, 0x77), (0x1E84, 0x57), (0x1E85, 0x77), (0x1E86, 0x57), (0x1E87, 0x77),
    (0x1E88, 0x57), (0x1E89, 0x77), (0x1E8A, 0x58), (0x1E8B, 0x78), (0x1E8C, 0x58),
    (0x1E8D, 0x78), (0x1E8E, 0x59), (0x1E8F, 0x79), (0x1E90, 0x5A), (0x1E91, 0x7A),
    (0x1E92, 0x5A), (0x1E93, 0x7A), (0x1E94, 0x5A), (0x1E95, 0x7A), (0x1E96, 0x68),
    (0x1E97, 0x74), (0x1E98, 0x77), (0x1E99, 0x79), (0x1EA0, 0x41), (0x1EA1, 0x61),
    (0x1EA2, 0x41), (0x1EA3, 0x61), (0x1EA4, 0x41), (0x1EA5, 0x61), (0x1EA6, 0x41),
    (0x1EA7, 0x61), (0x1EA8, 0x41), (0x1EA9, 0x61), (0x1EAA, 0x41), (0x1EAB, 0x61),
    (0x1EAC, 0x41), (0x1EAD, 0x61), (0x1EAE, 0x41), (0x1EAF, 0x61), (0x1EB0, 0x41),
    (0x1EB1, 0x61), (0x1EB2, 0x41), (0x1EB3, 0x61), (0x1EB4, 0x41), (0x1EB5, 0x61),
    (0x1EB6, 0x41), (0x1EB7, 0x61), (0x1EB8, 0x45), (0x1EB9, 0x65), (0x1EBA, 0x45),
    (0x1EBB, 0x65), (0x1EBC, 0x45), (0x1EBD, 0x65), (0x1EBE, 0x45), (0x1EBF, 0x65),
    (0x1EC0, 0x45), (0x1EC1, 0x65), (0x1EC2, 0x45), (0x1EC3, 0x65), (0x1EC4, 0x45),
    (0x1EC5, 0x65), (0x1EC6, 0x45), (0x1EC7, 0x65), (0x1EC8, 0x49), (0x1EC9, 0x69),
    (0x1ECA, 0x49), (0x1ECB, 0x69), (0x1ECC, 0x4F), (0x1ECD, 0x6F), (0x1ECE, 0x4F),
    (0x1ECF, 0x6F), (0x1ED0, 0x4F), (0x1ED1, 0x6F), (0x1ED2, 0x4F), (0x1ED3, 0x6F),
    (0x1ED4, 0x4F), (0x1ED5, 0x6F), (0x1ED6, 0x4F), (0x1ED7, 0x6F), (0x1ED8, 0x4F),
    (0x1ED9, 0x6F), (0x1EDA, 0x4F), (0x1EDB, 0x6F), (0x1EDC, 0x4F), (0x1EDD, 0x6F),
    (0x1EDE, 0x4F), (0x1EDF, 0x6F), (0x1EE0, 0x4F), (0x1EE1, 0x6F), (0x1EE2, 0x4F),
    (0x1EE3, 0x6F), (0x1EE4, 0x55), (0x1EE5, 0x75), (0x1EE6, 0x55), (0x1EE7, 0x75),
    (0x1EE8, 0x55), (0x1EE9, 0x75), (0x1EEA, 0x55), (0x1EEB, 0x75), (0x1EEC, 0x55),
    (0x1EED, 0x75), (0x1EEE, 0x55), (0x1EEF, 0x75), (0x1EF0, 0x55), (0x1EF1, 0x75),
    (0x1EF2, 0x59), (0x1EF3, 0x79), (0x1EF4, 0x59), (0x1EF5, 0x79), (0x1EF6, 0x59),
    (0x1EF7, 0x79), (0x1EF8, 0x59), (0x1EF9, 0x79), (0x2000, 0x20), (0x2001, 0x20),
    (0x2002, 0x20), (0x2003, 0x20), (0x2004, 0x20), (0x2005, 0x20), (0x2006, 0x20),
    (0x2007, 0x20), (0x2008, 0x20), (0x2009, 0x20), (0x200A, 0x20), (0x2010, 0x2D),
    (0x2011, 0x2D), (0x2012, 0x2D), (0x2013, 0x2D), (0x2014, 0x2D), (0x2015, 0x2D),
    (0x2018, 0x27), (0x2019, 0x27), (0x201A, 0x2C), (0x201B, 0x27), (0x201C, 0x22),
    (0x201D, 0x22), (0x201E, 0x22), (0x201F, 0x22), (0x2022, 0x2E), (0x2024, 0x2E),
    (0x2026, 0x2E), (0x2032, 0x27), (0x2033, 0x22), (0x2035, 0x60), (0x2039, 0x3C),
    (0x203A, 0x3E), (0x2044, 0x2F), (0x2102, 0x43), (0x210A, 0x67), (0x210B, 0x48),
    (0x2110, 0x49), (0x2112, 0x4C), (0x2115, 0x4E), (0x2119, 0x50), (0x211A, 0x51),
    (0x211D, 0x52), (0x2122, 0x54), (0x2124, 0x5A), (0x212E, 0x65), (0x2131, 0x46),
    (0x2133, 0x4D), (0x2212, 0x2D), (0x2215, 0x2F), (0x2216, 0x5C), (0x2217, 0x2A),
    (0x2223, 0x7C), (0x2236, 0x3A), (0x223C, 0x7E), (0x2264, 0x3C), (0x2265, 0x3E),
    (0x3000, 0x20), (0xFF01, 0x21), (0xFF02, 0x22), (0xFF03, 0x23), (0xFF04, 0x24),
    (0xFF05, 0x25), (0xFF06, 0x26), (0xFF07, 0x27), (0xFF08, 0x28), (0xFF09, 0x29),
    (0xFF0A, 0x2A), (0xFF0B, 0x2B), (0xFF0C, 0x2C), (0xFF0D, 0x2D), (0xFF0E, 0x2E),
    (0xFF0F, 0x2F), (0xFF10, 0x30), (0xFF11, 0x31), (0xFF12, 0x32), (0xFF13, 0x33),
    (0xFF14, 0x34), (0xFF15, 0x35), (0xFF16, 0x36), (0xFF17, 0x37), (0xFF18, 0x38),
    (0xFF19, 0x39), (0xFF1A, 0x3A), (0xFF1B, 0x3B), (0xFF1C, 0x3C), (0xFF1D, 0x3D),
    (0xFF1E, 0x3E), (0xFF1F, 0x3F), (0xFF20, 0x40), (0xFF21, 0x41), (0xFF22, 0x42),
    (0xFF23, 0x43), (0xFF24, 0x44), (0xFF25, 0x45), (0xFF26, 0x46), (0xFF27, 0x47),
    (0xFF28, 0x48), (0xFF29, 0x49), (0xFF2A, 0x4A), (0xFF2B, 0x4B), (0xFF2C, 0x4C),
    (0xFF2D, 0x4D), (0xFF2E, 0x4E), (0xFF2F, 0x4F), (0xFF30, 0x50), (0xFF31, 0x51),
    (0xFF32, 0x52), (0xFF33, 0x53), (0xFF34, 0x54), (0xFF35, 0x55), (0xFF36, 0x56),
    (0xFF37, 0x57), (0xFF38, 0x58), (0xFF39, 0x59), (0xFF3A, 0x5A), (0xFF3B, 0x5B),
    (0xFF3C, 0x5C), (0xFF3D, 0x5D), (0xFF3E, 0x5E), (0xFF3F, 0x5F), (0xFF40, 0x60),
    (0xFF41, 0x61), (0xFF42, 0x62), (0xFF43, 0x63), (0xFF44, 0x64), (0xFF45, 0x65),
    (0xFF46, 0x66), (0xFF47, 0x67), (0xFF48, 0x68), (0xFF49, 0x69), (0xFF4A, 0x6A),
    (0xFF4B, 0x6B), (0xFF4C, 0x6C), (0xFF4D, 0x6D), (0xFF4E, 0x6E), (0xFF4F, 0x6F),
    (0xFF50, 0x70), (0xFF51, 0x71), (0xFF52, 0x72), (0xFF53, 0x73), (0xFF54, 0x74),
    (0xFF55, 0x75), (0xFF56, 0x76), (0xFF57, 0x77), (0xFF58, 0x78), (0xFF59, 0x79),
    (0xFF5A, 0x7A), (0xFF5B, 0x7B), (0xFF5C, 0x7C), (0xFF5D, 0x7D), (0xFF5E, 0x7E),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_ascii() {
        assert!(BEST_FIT.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert!(BEST_FIT.iter().all(|&(source, byte)| source > 0xFF && byte.is_ascii()));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(BestFitFallback::lookup(0x0141), Some(b'L')); // Ł
        assert_eq!(BestFitFallback::lookup(0x0161), Some(b's')); // š
        assert_eq!(BestFitFallback::lookup(0x2014), Some(b'-')); // em dash
        assert_eq!(BestFitFallback::lookup(0x201C), Some(b'"'));
        assert_eq!(BestFitFallback::lookup(0x2026), Some(b'.'));
        assert_eq!(BestFitFallback::lookup(0xFF21), Some(b'A')); // full-width A
        assert_eq!(BestFitFallback::lookup(0xFF5E), Some(b'~'));
        assert_eq!(BestFitFallback::lookup(0x4E2D), None);
    }

    #[test]
    fn test_buffer_falls_back_to_question_mark() {
        let mut buffer = BestFitFallback.create_buffer();
        assert!(buffer.fallback(0x0107, 0).unwrap());
        assert_eq!(buffer.next_unit(), u16::from(b'c'));

        assert!(buffer.fallback(0x4E2D, 1).unwrap());
        assert_eq!(buffer.next_unit(), u16::from(b'?'));

        assert!(buffer.fallback_pair(0xD83D, 0xDE00, 2).unwrap());
        assert_eq!(buffer.remaining(), 1);
        assert_eq!(buffer.next_unit(), u16::from(b'?'));
        assert_eq!(buffer.next_unit(), 0);
    }
}
