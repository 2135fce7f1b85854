/// Maintenance templates that flag an article as lacking sources.
pub const UNSOURCED_TEMPLATES: &[&str] = &[
    "Kaynaksız",
    "Kaynak yok",
    "Kaynak belirtilmeli",
    "Kaynak eksik",
    "Unreferenced",
    "Unsourced",
    "Refimprove",
    "Kaynak az",
    "Daha fazla kaynak",
    "Daha fazla dipnot",
];

pub const INFOBOX_TEMPLATES: &[&str] = &[
    "Futbolcu bilgi kutusu",
    "Futbolcu bilgi",
    "Futbolcu",
    "Futbol oyuncusu",
    "Football player infobox",
];

pub const INFOBOX_RENAMES: &[(&str, &str)] = &[
    ("adı", "ad"),
    ("altyapıyıl", "altyapıyıl1"),
    ("altyapı", "altyapıkulübü1"),
    ("altyapıkulübü", "altyapıkulübü1"),
    ("altyapıkulüp", "altyapıkulübü1"),
    ("boy", "boyu"),
    ("altyapıkulüp1", "altyapıkulübü1"),
    ("altyapıkulüp2", "altyapıkulübü2"),
    ("altyapıkulüp3", "altyapıkulübü3"),
    ("doğduğuyer", "doğumyeri"),
    ("isim", "ad"),
    ("tam adı", "tamadı"),
];

pub const INFOBOX_DELETES: &[&str] = &[
    "toplammaç",
    "toplamgol",
    "kilo",
    "toplammillimaç",
    "toplammilligol",
];

pub const INFOBOX_SUMMARY: &str = "[[Özel:Fark/36262833|Bot isteği]]";

pub const PEOPLE_WITHOUT_INFOBOX: &str = "Bilgi kutusu bulunmayan kişiler";
pub const FOOTBALLERS_WITHOUT_INFOBOX: &str = "Bilgi kutusu bulunmayan futbolcular";
pub const FOOTBALLER_CATEGORY_KEYWORD: &str = "futbolcu";

pub const TALK_NAMESPACE: &str = "Tartışma";
pub const SOURCE_TALK_NAMESPACE: &str = "Talk";
pub const WIKIPROJECT_BANNER: &str = "Vikiproje";
pub const WIKIPROJECT_SUMMARY: &str = "Vikiproje şablonları eklendi";

/// English WikiProject banner names and their Turkish project names.
pub const WIKIPROJECT_MAP: &[(&str, &str)] = &[
    ("WikiProject Science", "Bilim"),
    ("WikiProject Biology", "Biyoloji"),
    ("WikiProject Medicine", "Tıp"),
    ("WikiProject Chemistry", "Kimya"),
    ("WikiProject Physics", "Fizik"),
    ("WikiProject Mathematics", "Matematik"),
    ("WikiProject Technology", "Teknoloji"),
    ("WikiProject Computer science", "Bilgisayar"),
    ("WikiProject Astronomy", "Astronomi"),
    ("WikiProject History of Science", "Bilim tarihi"),
    ("WikiProject Biography", "Biyografi"),
    ("WPBIO", "Biyografi"),
    ("WPBiography", "Biyografi"),
    ("WikiProject Geography", "Coğrafya"),
    ("WikiProject Cities", "Yerleşim"),
    ("WikiProject Countries", "Ülkeler"),
    ("WikiProject Turkey", "Türkiye"),
    ("WikiProject History", "Tarih"),
    ("WikiProject Military history", "Askeri tarih"),
    ("WikiProject Film", "Film"),
    ("WikiProject Music", "Müzik"),
    ("WikiProject Literature", "Edebiyat"),
    ("WikiProject Football", "Futbol"),
    ("WikiProject Sports", "Spor"),
    ("WikiProject Politics", "Siyaset"),
    ("WikiProject Religion", "Din"),
    ("WikiProject Philosophy", "Felsefe"),
    ("WikiProject Education", "Eğitim"),
    ("WikiProject Companies", "Şirketler"),
];

pub fn unsourced_summary(removed: usize, draft: bool) -> String {
    if draft {
        format!("Bot: Taslak maddeden {removed} kaynaksız şablonu kaldırıldı")
    } else {
        format!("Bot: {removed} kaynaksız şablonu kaldırıldı (maddede <ref> etiketi mevcut)")
    }
}

pub fn retarget_summary(from: &str, to: &str) -> String {
    format!("Futbolcu olduğu için [[Kategori:{from}]] → [[Kategori:{to}]] değiştirildi")
}

pub fn strip_category_summary(name: &str) -> String {
    format!("[[Kategori:{name}]] kategorisi kaldırıldı")
}

pub fn add_category_summary(name: &str, uncommented: bool) -> String {
    if uncommented {
        format!("[[Kategori:{name}]] kategorisi yorumdan çıkarıldı ve aktif hale getirildi")
    } else {
        format!("[[Kategori:{name}]] kategorisi eklendi")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_use_turkish_wording() {
        assert_eq!(
            unsourced_summary(2, true),
            "Bot: Taslak maddeden 2 kaynaksız şablonu kaldırıldı"
        );
        assert_eq!(
            unsourced_summary(1, false),
            "Bot: 1 kaynaksız şablonu kaldırıldı (maddede <ref> etiketi mevcut)"
        );
        assert_eq!(
            add_category_summary("Fizikçiler", false),
            "[[Kategori:Fizikçiler]] kategorisi eklendi"
        );
        assert_eq!(
            retarget_summary(PEOPLE_WITHOUT_INFOBOX, FOOTBALLERS_WITHOUT_INFOBOX),
            "Futbolcu olduğu için [[Kategori:Bilgi kutusu bulunmayan kişiler]] → [[Kategori:Bilgi kutusu bulunmayan futbolcular]] değiştirildi"
        );
    }

    #[test]
    fn rename_table_has_no_duplicate_sources() {
        for (index, (from, _)) in INFOBOX_RENAMES.iter().enumerate() {
            assert!(
                INFOBOX_RENAMES[index + 1..].iter().all(|(other, _)| other != from),
                "duplicate rename source {from}"
            );
        }
    }
}
