//! Static book catalog (66 books, Protestant canon order).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    /// Section heading used in the sidebar.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Old => "舊約聖經",
            Self::New => "新約聖經",
        }
    }

    /// Short label used in the chapter header.
    pub fn label(self) -> &'static str {
        match self {
            Self::Old => "舊約",
            Self::New => "新約",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: &'static str,
    pub name: &'static str,
    pub chapters: u32,
    pub testament: Testament,
}

impl Book {
    pub fn has_chapter(&self, chapter: u32) -> bool {
        (1..=self.chapters).contains(&chapter)
    }
}

const fn old(id: &'static str, name: &'static str, chapters: u32) -> Book {
    Book {
        id,
        name,
        chapters,
        testament: Testament::Old,
    }
}

const fn new(id: &'static str, name: &'static str, chapters: u32) -> Book {
    Book {
        id,
        name,
        chapters,
        testament: Testament::New,
    }
}

pub static BIBLE_BOOKS: &[Book] = &[
    old("genesis", "創世記", 50),
    old("exodus", "出埃及記", 40),
    old("leviticus", "利未記", 27),
    old("numbers", "民數記", 36),
    old("deuteronomy", "申命記", 34),
    old("joshua", "約書亞記", 24),
    old("judges", "士師記", 21),
    old("ruth", "路得記", 4),
    old("1samuel", "撒母耳記上", 31),
    old("2samuel", "撒母耳記下", 24),
    old("1kings", "列王紀上", 22),
    old("2kings", "列王紀下", 25),
    old("1chronicles", "歷代志上", 29),
    old("2chronicles", "歷代志下", 36),
    old("ezra", "以斯拉記", 10),
    old("nehemiah", "尼希米記", 13),
    old("esther", "以斯帖記", 10),
    old("job", "約伯記", 42),
    old("psalms", "詩篇", 150),
    old("proverbs", "箴言", 31),
    old("ecclesiastes", "傳道書", 12),
    old("songofsongs", "雅歌", 8),
    old("isaiah", "以賽亞書", 66),
    old("jeremiah", "耶利米書", 52),
    old("lamentations", "耶利米哀歌", 5),
    old("ezekiel", "以西結書", 48),
    old("daniel", "但以理書", 12),
    old("hosea", "何西阿書", 14),
    old("joel", "約珥書", 3),
    old("amos", "阿摩司書", 9),
    old("obadiah", "俄巴底亞書", 1),
    old("jonah", "約拿書", 4),
    old("micah", "彌迦書", 7),
    old("nahum", "那鴻書", 3),
    old("habakkuk", "哈巴谷書", 3),
    old("zephaniah", "西番雅書", 3),
    old("haggai", "哈該書", 2),
    old("zechariah", "撒迦利亞書", 14),
    old("malachi", "瑪拉基書", 4),
    new("matthew", "馬太福音", 28),
    new("mark", "馬可福音", 16),
    new("luke", "路加福音", 24),
    new("john", "約翰福音", 21),
    new("acts", "使徒行傳", 28),
    new("romans", "羅馬書", 16),
    new("1corinthians", "哥林多前書", 16),
    new("2corinthians", "哥林多後書", 13),
    new("galatians", "加拉太書", 6),
    new("ephesians", "以弗所書", 6),
    new("philippians", "腓立比書", 4),
    new("colossians", "歌羅西書", 4),
    new("1thessalonians", "帖撒羅尼迦前書", 5),
    new("2thessalonians", "帖撒羅尼迦後書", 3),
    new("1timothy", "提摩太前書", 6),
    new("2timothy", "提摩太後書", 4),
    new("titus", "提多書", 3),
    new("philemon", "腓利門書", 1),
    new("hebrews", "希伯來書", 13),
    new("james", "雅各書", 5),
    new("1peter", "彼得前書", 5),
    new("2peter", "彼得後書", 3),
    new("1john", "約翰一書", 5),
    new("2john", "約翰二書", 1),
    new("3john", "約翰三書", 1),
    new("jude", "猶大書", 1),
    new("revelation", "啟示錄", 22),
];

pub fn find_book(id: &str) -> Option<&'static Book> {
    BIBLE_BOOKS.iter().find(|b| b.id == id)
}
