//! Timeline clip editing and the per-frame visibility rule.
//!
//! Clip edits either apply completely or are refused with a
//! [`ClipRefusal`]; a refused edit leaves the clip list untouched.

use thiserror::Error;

use crate::ids::ClipId;
use crate::layer::TimelineClip;

/// Why a clip edit was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipRefusal {
    #[error("clip {0} not found")]
    NotFound(ClipId),
    #[error("clip length must be at least one frame")]
    EmptyClip,
    #[error("clip {id} would overlap clip {other}")]
    Overlap { id: ClipId, other: ClipId },
    #[error("clips {first} and {second} are not continuous")]
    NotContinuous { first: ClipId, second: ClipId },
    #[error("cannot split clip {id} at frame {frame}")]
    InvalidSplit { id: ClipId, frame: u32 },
    #[error("clip id {0} already exists")]
    DuplicateId(ClipId),
    #[error("clip {0} would run past the last representable frame")]
    OutOfRange(ClipId),
}

fn find(clips: &[TimelineClip], id: &ClipId) -> Result<usize, ClipRefusal> {
    clips
        .iter()
        .position(|c| &c.id == id)
        .ok_or_else(|| ClipRefusal::NotFound(id.clone()))
}

fn check_overlap(
    clips: &[TimelineClip],
    candidate: &TimelineClip,
    ignore: &[&ClipId],
) -> Result<(), ClipRefusal> {
    match clips
        .iter()
        .filter(|c| !ignore.contains(&&c.id))
        .find(|c| c.overlaps(candidate))
    {
        Some(other) => Err(ClipRefusal::Overlap {
            id: candidate.id.clone(),
            other: other.id.clone(),
        }),
        None => Ok(()),
    }
}

fn check_range(clip: &TimelineClip) -> Result<(), ClipRefusal> {
    if clip.fits() {
        Ok(())
    } else {
        Err(ClipRefusal::OutOfRange(clip.id.clone()))
    }
}

fn sort(clips: &mut [TimelineClip]) {
    clips.sort_by_key(|c| c.start_frame);
}

/// Insert a clip, keeping the list sorted and non-overlapping.
pub fn add_clip(clips: &mut Vec<TimelineClip>, clip: TimelineClip) -> Result<(), ClipRefusal> {
    if clip.length == 0 {
        return Err(ClipRefusal::EmptyClip);
    }
    if clips.iter().any(|c| c.id == clip.id) {
        return Err(ClipRefusal::DuplicateId(clip.id));
    }
    check_range(&clip)?;
    check_overlap(clips, &clip, &[])?;
    clips.push(clip);
    sort(clips);
    Ok(())
}

/// Remove a clip; returns whether it existed.
pub fn remove_clip(clips: &mut Vec<TimelineClip>, id: &ClipId) -> bool {
    let before = clips.len();
    clips.retain(|c| &c.id != id);
    clips.len() != before
}

/// Move a clip to a new start frame, keeping its length.
pub fn move_clip(
    clips: &mut [TimelineClip],
    id: &ClipId,
    start_frame: u32,
) -> Result<(), ClipRefusal> {
    let idx = find(clips, id)?;
    let mut moved = clips[idx].clone();
    moved.start_frame = start_frame;
    check_range(&moved)?;
    check_overlap(clips, &moved, &[id])?;
    clips[idx] = moved;
    sort(clips);
    Ok(())
}

/// Change a clip's length, keeping its start frame.
pub fn resize_clip(clips: &mut [TimelineClip], id: &ClipId, length: u32) -> Result<(), ClipRefusal> {
    if length == 0 {
        return Err(ClipRefusal::EmptyClip);
    }
    let idx = find(clips, id)?;
    let mut resized = clips[idx].clone();
    resized.length = length;
    check_range(&resized)?;
    check_overlap(clips, &resized, &[id])?;
    clips[idx] = resized;
    Ok(())
}

/// Merge two back-to-back clips into the earlier one.
///
/// Refused unless the later clip starts exactly one frame after the earlier ends.
pub fn merge_clips(
    clips: &mut Vec<TimelineClip>,
    a: &ClipId,
    b: &ClipId,
) -> Result<(), ClipRefusal> {
    let ia = find(clips, a)?;
    let ib = find(clips, b)?;
    let (first, second) = if clips[ia].start_frame <= clips[ib].start_frame {
        (ia, ib)
    } else {
        (ib, ia)
    };
    let continuous = clips[first].end_frame().checked_add(1) == Some(clips[second].start_frame);
    if first == second || !continuous {
        return Err(ClipRefusal::NotContinuous {
            first: clips[first].id.clone(),
            second: clips[second].id.clone(),
        });
    }
    let length = clips[first]
        .length
        .checked_add(clips[second].length)
        .ok_or_else(|| ClipRefusal::OutOfRange(clips[first].id.clone()))?;
    clips[first].length = length;
    clips.remove(second);
    Ok(())
}

/// Split a clip so that `at_frame` becomes the first frame of a new clip `new_id`.
///
/// Refused for single-frame clips and for split points that would leave
/// either half empty.
pub fn split_clip(
    clips: &mut Vec<TimelineClip>,
    id: &ClipId,
    at_frame: u32,
    new_id: ClipId,
) -> Result<(), ClipRefusal> {
    let idx = find(clips, id)?;
    let clip = &clips[idx];
    if clip.length <= 1 || at_frame <= clip.start_frame || at_frame > clip.end_frame() {
        return Err(ClipRefusal::InvalidSplit {
            id: id.clone(),
            frame: at_frame,
        });
    }
    if clips.iter().any(|c| c.id == new_id) {
        return Err(ClipRefusal::DuplicateId(new_id));
    }
    let tail = TimelineClip::new(new_id, at_frame, clip.end_frame() - at_frame + 1);
    clips[idx].length = at_frame - clips[idx].start_frame;
    clips.insert(idx + 1, tail);
    Ok(())
}

/// Whether an object born at `born_frame` is visible at `frame`.
///
/// Never visible before birth. Otherwise visible when the clip covering
/// `frame` also covers the birth frame, or on the birth frame itself. An
/// object whose birth clip has ended goes invisible again.
pub fn is_visible_at(clips: &[TimelineClip], born_frame: u32, frame: u32) -> bool {
    if frame < born_frame {
        return false;
    }
    if born_frame == frame {
        return true;
    }
    clips
        .iter()
        .find(|c| c.contains(frame))
        .is_some_and(|c| c.contains(born_frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: &str, start: u32, length: u32) -> TimelineClip {
        TimelineClip::new(ClipId::new(id), start, length)
    }

    fn ids(clips: &[TimelineClip]) -> Vec<&str> {
        clips.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_add_keeps_sorted_and_allows_gaps() {
        let mut clips = Vec::new();
        add_clip(&mut clips, clip("b", 20, 5)).unwrap();
        add_clip(&mut clips, clip("a", 0, 10)).unwrap();
        assert_eq!(ids(&clips), vec!["a", "b"]);
    }

    #[test]
    fn test_add_refuses_overlap_and_empty() {
        let mut clips = vec![clip("a", 0, 10)];
        assert!(matches!(
            add_clip(&mut clips, clip("b", 9, 3)),
            Err(ClipRefusal::Overlap { .. })
        ));
        assert_eq!(add_clip(&mut clips, clip("c", 30, 0)), Err(ClipRefusal::EmptyClip));
        assert_eq!(clips.len(), 1);
    }

    #[test]
    fn test_move_and_resize() {
        let mut clips = vec![clip("a", 0, 10), clip("b", 20, 5)];
        move_clip(&mut clips, &ClipId::new("b"), 12).unwrap();
        assert_eq!(clips[1].start_frame, 12);
        assert!(move_clip(&mut clips, &ClipId::new("b"), 5).is_err());
        assert!(resize_clip(&mut clips, &ClipId::new("a"), 13).is_err());
        resize_clip(&mut clips, &ClipId::new("a"), 12).unwrap();
        assert_eq!(clips[0].end_frame(), 11);
    }

    #[test]
    fn test_clips_past_the_last_frame_are_refused() {
        let mut clips = vec![clip("a", 0, 10)];
        let near_end = u32::MAX - 4;
        assert_eq!(
            add_clip(&mut clips, clip("b", near_end, 6)),
            Err(ClipRefusal::OutOfRange(ClipId::new("b")))
        );
        add_clip(&mut clips, clip("b", near_end, 5)).unwrap();
        assert_eq!(clips[1].end_frame(), u32::MAX);
        assert!(clips[1].contains(u32::MAX));
        assert!(!clips[1].overlaps(&clips[0]));

        assert_eq!(
            move_clip(&mut clips, &ClipId::new("a"), u32::MAX - 5),
            Err(ClipRefusal::OutOfRange(ClipId::new("a")))
        );
        assert_eq!(
            resize_clip(&mut clips, &ClipId::new("b"), 6),
            Err(ClipRefusal::OutOfRange(ClipId::new("b")))
        );
        assert_eq!(clips, vec![clip("a", 0, 10), clip("b", near_end, 5)]);


        // together they would span u32::MAX + 1 frames
        let mut whole = vec![clip("c", 0, u32::MAX), clip("d", u32::MAX, 1)];
        assert_eq!(
            merge_clips(&mut whole, &ClipId::new("c"), &ClipId::new("d")),
            Err(ClipRefusal::OutOfRange(ClipId::new("c")))
        );
        assert_eq!(whole.len(), 2);
    }

    #[test]
    fn test_merge_continuous() {
        let mut clips = vec![clip("a", 0, 10), clip("b", 10, 5)];
        merge_clips(&mut clips, &ClipId::new("b"), &ClipId::new("a")).unwrap();
        assert_eq!(clips, vec![clip("a", 0, 15)]);
    }

    #[test]
    fn test_merge_refuses_gap() {
        let mut clips = vec![clip("a", 0, 10), clip("b", 11, 5)];
        let before = clips.clone();
        assert!(matches!(
            merge_clips(&mut clips, &ClipId::new("a"), &ClipId::new("b")),
            Err(ClipRefusal::NotContinuous { .. })
        ));
        assert_eq!(clips, before);
    }

    #[test]
    fn test_split() {
        let mut clips = vec![clip("a", 10, 10)];
        split_clip(&mut clips, &ClipId::new("a"), 15, ClipId::new("b")).unwrap();
        assert_eq!(clips, vec![clip("a", 10, 5), clip("b", 15, 5)]);
    }

    #[test]
    fn test_split_refuses_single_frame_and_edges() {
        let mut clips = vec![clip("a", 10, 1), clip("c", 20, 4)];
        assert!(split_clip(&mut clips, &ClipId::new("a"), 10, ClipId::new("x")).is_err());
        assert!(split_clip(&mut clips, &ClipId::new("c"), 20, ClipId::new("x")).is_err());
        assert!(split_clip(&mut clips, &ClipId::new("c"), 24, ClipId::new("x")).is_err());
        split_clip(&mut clips, &ClipId::new("c"), 23, ClipId::new("x")).unwrap();
        assert_eq!(clips.len(), 3);
    }

    #[test]
    fn test_visibility_rule() {
        let clips = vec![clip("a", 10, 20)];
        assert!(!is_visible_at(&clips, 20, 15));
        assert!(is_visible_at(&clips, 20, 25));
        assert!(!is_visible_at(&clips, 20, 35));
        assert!(is_visible_at(&clips, 20, 20));
    }

    #[test]
    fn test_visibility_without_clips_only_on_birth_frame() {
        assert!(is_visible_at(&[], 0, 0));
        assert!(!is_visible_at(&[], 0, 1));
    }

    #[test]
    fn test_visibility_clip_not_containing_birth() {
        let clips = vec![clip("a", 0, 10), clip("b", 10, 10)];
        // born in clip a, frame in clip b
        assert!(!is_visible_at(&clips, 5, 12));
        assert!(is_visible_at(&clips, 5, 9));
    }
}
