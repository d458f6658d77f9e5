use std::borrow::Cow;

/// Displays bytes in string form if they make up a string, else just displays them as bytes.
pub(crate) fn display_magic_number(bytes: &[u8]) -> String {
	std::str::from_utf8(bytes).map(str::to_owned).unwrap_or(format!("{bytes:?}"))
}

/// If a `_<int>_<int>_<int>` suffix starts at byte `start` of `s`, returns the byte index it ends at.
fn match_instance_suffix(s: &[u8], start: usize) -> Option<usize> {
	let mut pos = start;
	for _ in 0..3 {
		if s.get(pos) != Some(&b'_') {
			return None;
		}
		pos += 1;

		let digits = s[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
		if digits == 0 {
			return None;
		}
		pos += digits;
	}
	Some(pos)
}

/// Returns `true` if `name` contains a `_<int>_<int>_<int>` sequence anywhere.
pub fn has_instance_suffix(name: &str) -> bool {
	(0..name.len()).any(|i| match_instance_suffix(name.as_bytes(), i).is_some())
}

/// Removes every `_<int>_<int>_<int>` sequence from a texture name, matching from left to right.
///
/// The compiler appends these to materials it generates per brush (e.g. for cubemaps, `maps/foo/brick_512_64_128`), stripping
/// them collapses the variants down to one shared name. Applying this twice gives the same result as applying it once.
pub fn normalize_texture_name(name: &str) -> Cow<'_, str> {
	let bytes = name.as_bytes();
	let mut out: Option<String> = None;
	let (mut i, mut copied_up_to) = (0, 0);

	while i < bytes.len() {
		match match_instance_suffix(bytes, i) {
			Some(end) => {
				// The pattern is all ASCII, so `i` and `end` are always char boundaries.
				out.get_or_insert_with(String::new).push_str(&name[copied_up_to..i]);
				i = end;
				copied_up_to = end;
			}
			None => i += 1,
		}
	}

	match out {
		Some(mut out) => {
			out.push_str(&name[copied_up_to..]);
			Cow::Owned(out)
		}
		None => Cow::Borrowed(name),
	}
}
