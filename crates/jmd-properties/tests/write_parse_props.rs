use proptest::prelude::*;

const PROPTEST_CASES: u32 = 256;

fn arb_text() -> impl Strategy<Value = String> {
    // Small pool biased towards characters the format treats specially.
    let pool = prop_oneof![
        10 => prop::sample::select(vec!['a', 'b', 'z', '0', '9', '.', '-', '_']),
        2 => Just(' '),
        1 => Just('\t'),
        1 => Just('='),
        1 => Just(':'),
        1 => Just('#'),
        1 => Just('!'),
        1 => Just('\\'),
        1 => Just('\n'),
        1 => Just('\r'),
        1 => Just('\u{e9}'),
        1 => Just('\u{4e2d}'),
    ];
    prop::collection::vec(pool, 0..12).prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn written_entries_parse_back_unchanged(
        entries in prop::collection::vec((arb_text(), arb_text()), 0..8)
    ) {
        let text = jmd_properties::write(entries.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let parsed = jmd_properties::parse(&text);

        let got: Vec<(String, String)> = parsed
            .entries
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        prop_assert_eq!(got, entries);
    }
}
