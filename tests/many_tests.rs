mod utils;

const CASES: &[(&str, &str)] = &[
    (r"\d+", "abc123def"),
    (r"foo", "foobar"),
    (r"bar", "foobar"),
    (r"baz", "foobar"),
    (r"(\w+)-(\d+)", "test-42"),
    (r"(\d+)?", ""),
    (r"[a-z]{3}", "xyz"),
    (r"invalid[", "anything"),
    (r"\d+=\d+", "124221=12323=2=abd"),
    (
        r"Sherlock Holmes|Shrelock Holm|John Watson|Irene Adler|Inspector Lestrade|Professor Moriarty",
        "Professor Moriarty
        Sherlock Holmes
        John Watson
        Irene Adler
        ",
    ),
    (
        r".*d",
        "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaad",
    ),
    (r"a*", "baaab"),
    (r"x*", ""),
    (r"a{2,4}?", "aaaaa"),
    (r"(a|ab)(c|bcd)(d*)", "abcd"),
    (r"[^a-c]+", "abcdefabc"),
    (r"^abc$", "abc"),
    (r"(?m)^\w+$", "foo\nbar"),
    (r"(?i)HeLLo", "say hello"),
    (r"\bword\b", "a word, swordfish"),
    (r"é+", "aééa"),
    (r"(?:ab)*c", "xababcabc"),
    (r"(?P<year>\d{4})-(?P<month>\d{2})", "on 2024-10 and 2025-01"),
];

#[test]
fn test_many() {
    for (pattern, input) in CASES {
        utils::check_all_engines(pattern, input);
    }
}
