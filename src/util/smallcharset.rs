// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A set of small characters, those with code points below 128.

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct SmallCharSet {
    pub bits: u128,
}

impl SmallCharSet {
    #[inline]
    fn contains(&self, n: u8) -> bool {
        0 != (self.bits & (1 << (n as usize)))
    }

    /// Count the number of bytes at the beginning of `buf` which are not
    /// in the set. See `BufferQueue::pop_except_from`.
    pub fn nonmember_prefix_len(&self, buf: &str) -> u32 {
        let mut n = 0;
        for b in buf.bytes() {
            if b >= 128 || !self.contains(b) {
                n += 1;
            } else {
                break;
            }
        }
        n
    }
}

macro_rules! small_char_set ( ($($e:expr)+) => (
    $crate::util::smallcharset::SmallCharSet {
        bits: $( (1u128 << ($e as usize)) )|+
    }
));

#[cfg(test)]
mod test {
    use std::iter::repeat;

    #[test]
    fn nonmember_prefix() {
        for &c in ['<', '\0', '\r'].iter() {
            for x in 0..48 {
                for y in 0..48 {
                    let mut s = repeat("x").take(x).collect::<String>();
                    s.push(c);
                    s.push_str(&repeat("x").take(y).collect::<String>());
                    let set = small_char_set!('<' '\0' '\r');

                    assert_eq!(x as u32, set.nonmember_prefix_len(&s));
                }
            }
        }
    }

    #[test]
    fn high_bytes_are_never_members() {
        let set = small_char_set!('\n');
        assert_eq!(set.nonmember_prefix_len("héllo\n"), 6);
    }
}
