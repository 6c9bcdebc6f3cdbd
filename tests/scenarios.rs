use ipmerge::{merge, merge_lines, AddressFamily, Error, Parser};

fn merged(lines: &[&str]) -> Vec<String> {
    merge(lines).unwrap().iter().map(|b| b.to_string()).collect()
}

#[test]
fn halves_join_into_one_block() {
    assert_eq!(
        merged(&["192.168.0.0/25", "192.168.0.128/25"]),
        ["192.168.0.0/24"]
    );
}

#[test]
fn consecutive_hosts() {
    assert_eq!(
        merged(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]),
        ["10.0.0.1/32", "10.0.0.2/31"]
    );
}

#[test]
fn explicit_range_is_split() {
    assert_eq!(
        merged(&["10.0.0.0-10.0.0.5"]),
        ["10.0.0.0/30", "10.0.0.4/31"]
    );
}

#[test]
fn whole_ipv6_space() {
    assert_eq!(merged(&["::/0"]), ["::/0"]);
    assert_eq!(merged(&["::/0", "2001:db8::/32", "::1"]), ["::/0"]);
}

#[test]
fn prefix_bounds_follow_family() {
    assert_eq!(merged(&["2001:db8::/33"]), ["2001:db8::/33"]);
    match merge(["2001:db8::/129"]) {
        Err(Error::InvalidPrefixLength { family, input, .. }) => {
            assert_eq!(family, AddressFamily::V6);
            assert_eq!(input, "2001:db8::/129");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn distant_blocks_stay_apart() {
    assert_eq!(
        merged(&["192.168.1.0/24", "10.0.0.0/24"]),
        ["10.0.0.0/24", "192.168.1.0/24"]
    );
}

#[test]
fn mixed_families_are_grouped() {
    assert_eq!(
        merged(&["2001:db8::1", "10.0.0.0/8", "2001:db8::", "11.0.0.0/8"]),
        ["10.0.0.0/7", "2001:db8::/127"]
    );
}

#[test]
fn output_is_independent_of_input_order() {
    let lines = [
        "10.0.0.7",
        "10.0.0.0-10.0.0.5",
        "172.16.0.0/12",
        "10.0.0.6/31",
        "fe80::/10",
        "172.31.255.255",
    ];
    let mut reversed = lines;
    reversed.reverse();
    assert_eq!(merged(&lines), merged(&reversed));
    assert_eq!(
        merged(&lines),
        ["10.0.0.0/29", "172.16.0.0/12", "fe80::/10"]
    );
}

#[test]
fn output_merges_to_itself() {
    let first = merged(&["10.0.0.3-10.0.0.77", "10.0.1.0/24", "10.0.0.200"]);
    assert_eq!(merged(&first.iter().map(String::as_str).collect::<Vec<_>>()), first);
}

#[test]
fn strict_parser_rejects_host_bits() {
    let err = merge_lines(&Parser::new().strict(true), ["10.0.0.0/24", "10.0.1.1/24"]).unwrap_err();
    assert!(matches!(err, Error::UnalignedNetwork { prefix: 24, .. }));
    assert!(merge_lines(&Parser::new(), ["10.0.1.1/24"]).is_ok());
}
