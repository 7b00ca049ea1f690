//! Matroska chapter document, one chapter per track.

use std::path::Path;

use anyhow::Result;

use crate::chapter_id::{ChapterIdPool, ChapterIds};
use crate::metadata::Metadata;
use crate::xml::{XmlElement, write_document};

pub const CHAPTERS_DTD: &str = "matroskachapters.dtd";

/// `ChapterPhysicalEquiv` of a track.
const PHYSICAL_TRACK: &str = "20";

pub fn build_chapters(meta: &Metadata, ids: &ChapterIds<'_>) -> XmlElement {
    let mut root = XmlElement::new("Chapters");
    let edition = root.push(XmlElement::new("EditionEntry"));
    edition.push_text("EditionUID", ids.uid(-1));
    for (index, track) in meta.tracks.iter().enumerate() {
        let atom = edition.push(XmlElement::new("ChapterAtom"));
        atom.push_text("ChapterUID", ids.uid(index as isize));
        atom.push_text("ChapterPhysicalEquiv", PHYSICAL_TRACK);
        atom.push(XmlElement::new("ChapterDisplay"))
            .push_text("ChapterString", track.display_title());
        atom.push_text("ChapterTimeStart", track.start_time.to_mka());
    }
    root
}

pub fn write_chapters(meta: &Metadata, pool: &mut ChapterIdPool, path: &Path) -> Result<()> {
    let ids = pool.ids(meta.tracks.len());
    write_document(path, &build_chapters(meta, &ids), CHAPTERS_DTD)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::metadata::Overrides;
    use crate::source::AudioTags;
    use crate::tagwriter::build_tags;
    use crate::testing::{FakeReader, TempDir, cd_stream};

    fn album() -> Metadata {
        let mut reader = FakeReader::default();
        let mut files = Vec::new();
        for n in 1..=2u32 {
            let path = PathBuf::from(format!("/x/{n}.flac"));
            let mut tags = AudioTags::new(cd_stream(90))
                .with_tag("ALBUM", "A")
                .with_tag("ARTIST", "B")
                .with_tag("GENRE", "C")
                .with_tag("DATE", "2000")
                .with_tag("TITLE", format!("Part {n}"))
                .with_tag("TRACKNUMBER", n.to_string());
            if n == 2 {
                tags.insert("SUBTITLE", "Coda");
            }
            reader.add(&path, tags);
            files.push(path);
        }
        Metadata::from_files(&files, &Overrides::default(), &reader).unwrap()
    }

    #[test]
    fn chapters_mirror_tracks() {
        let meta = album();
        let mut pool = ChapterIdPool::seeded(11);
        let ids = pool.ids(2);
        let root = build_chapters(&meta, &ids);
        let edition = &root.children[0];
        assert_eq!(edition.children[0].text, Some(ids.uid(-1)));
        let atoms: Vec<_> = edition.find("ChapterAtom").collect();
        assert_eq!(atoms.len(), 2);
        let second = atoms[1];
        let text = |name: &str| second.find(name).next().unwrap().text.clone().unwrap();
        assert_eq!(text("ChapterUID"), ids.uid(1));
        assert_eq!(text("ChapterPhysicalEquiv"), "20");
        assert_eq!(text("ChapterTimeStart"), "00:01:30.000000000");
        let display = second.find("ChapterDisplay").next().unwrap();
        assert_eq!(display.children[0].text.as_deref(), Some("Part 2: Coda"));
    }

    #[test]
    fn chapter_and_tag_uids_agree() {
        let meta = album();
        let dir = TempDir::new("chapters");
        let mut pool = ChapterIdPool::seeded(2);
        write_chapters(&meta, &mut pool, &dir.path().join("a.chapters.xml")).unwrap();
        crate::tagwriter::write_tags(&meta, &mut pool, &dir.path().join("a.xml")).unwrap();
        let chapters = std::fs::read_to_string(dir.path().join("a.chapters.xml")).unwrap();
        let tags = std::fs::read_to_string(dir.path().join("a.xml")).unwrap();
        assert!(chapters.contains(r#"<!DOCTYPE Chapters SYSTEM "matroskachapters.dtd">"#));
        let ids = pool.ids(2);
        for i in 0..2 {
            let uid = format!("<ChapterUID>{}</ChapterUID>", ids.uid(i));
            assert!(chapters.contains(&uid));
            assert!(tags.contains(&uid));
        }
        assert_eq!(build_tags(&meta, &ids).children.len(), 4);
    }
}
