//! Keyword corpus for the content classifier, one disjoint set per
//! level. Entries are stored lowercase; matching is substring-based so
//! CJK text needs no tokenisation. Level 1 carries a small everyday set
//! that only affects confidence; unmatched input defaults to level 1
//! anyway.

/// Everyday, unambiguously safe topics.
pub const LEVEL1_EVERYDAY: &[&str] = &[
    "你好", "早安", "午安", "晚安", "天氣", "天气", "吃飯", "吃饭", "上班", "下班", "工作",
    "電影", "电影", "音樂", "音乐", "旅行", "運動", "运动", "hello", "good morning",
    "good night", "weather", "lunch", "dinner", "movie", "music", "work today",
];

/// Romance without physical contact.
pub const LEVEL2_ROMANTIC: &[&str] = &[
    "喜歡你", "喜欢你", "愛你", "爱你", "想你", "想念你", "思念", "心動", "心动", "臉紅",
    "脸红", "害羞", "溫柔", "温柔", "甜蜜", "浪漫", "約會", "约会", "陪伴", "守護", "守护",
    "寵愛", "宠爱", "疼愛", "疼爱", "在意", "關心", "关心", "美麗", "美丽", "可愛", "可爱",
    "迷人", "心跳", "怦然", "悸動", "悸动", "靠近", "想親近", "想亲近",
    "miss you", "romantic", "date night", "sweetheart", "darling", "babe", "cuddle",
    "hold hands", "adore", "affection", "crush", "butterflies", "heartbeat",
];

/// Physical intimacy short of the explicit; includes the roleplay
/// scenario vocabulary the original corpus files under the same band.
pub const LEVEL3_INTIMATE: &[&str] = &[
    "親密", "亲密", "親吻", "亲吻", "親親", "亲亲", "擁抱", "拥抱", "抱著", "抱着", "抱住",
    "抱緊", "抱紧", "愛撫", "爱抚", "激情", "慾望", "欲望", "性感", "誘惑", "诱惑", "挑逗",
    "調情", "调情", "情慾", "情欲", "肉體", "肉体", "輕撫", "轻抚", "撫摸", "抚摸", "肌膚",
    "肌肤", "體溫", "体温", "顫抖", "颤抖", "酥麻", "觸碰", "触碰", "耳邊", "耳边", "呢喃",
    "想要你", "渴望你", "依偎", "撒嬌", "撒娇", "牽手", "牵手", "親熱", "亲热", "嬌喘",
    "娇喘", "低吟", "纏綿", "缠绵", "輕咬", "轻咬",
    "女僕", "女仆", "秘書", "護士", "霸總", "總裁", "制服", "cosplay", "角色扮演", "兔女郎",
    "浴室", "淋浴", "泡澡", "燭光", "辦公室", "办公室", "情侶酒店",
    "kiss", "kissing", "make out", "caress", "embrace", "spooning", "intimate",
    "passion", "desire", "sexy", "seduce", "tease", "flirt", "thigh", "whisper",
    "gasp", "tremble", "moan softly", "nurse outfit", "office lady", "maid outfit",
    "role play",
];

/// Explicit adult content; includes the fetish-toy vocabulary and the
/// emoji / leet-speak variants seen in the wild.
pub const LEVEL4_EXPLICIT: &[&str] = &[
    "做愛", "做爱", "愛愛", "爱爱", "啪啪啪", "性行為", "性行为", "性愛", "性爱", "高潮",
    "射精", "抽插", "口交", "乳交", "手交", "脫光", "脱光", "全裸", "赤裸", "裸露", "陰莖",
    "阴茎", "陰道", "阴道", "陰蒂", "阴蒂", "乳頭", "乳头", "奶頭", "奶头", "私處", "私处",
    "下體", "下体", "雞雞", "鸡鸡", "小穴", "蜜穴", "內褲", "内裤", "胸罩", "內衣", "内衣",
    "勃起", "呻吟", "打炮", "開房", "开房", "嘿咻", "乳暈", "乳晕", "乳溝", "乳沟", "陰部",
    "阴部", "巨乳", "床戲", "床戏", "色情", "黃片", "黄片", "肉棒", "龜頭", "龟头", "淫水",
    "愛液", "爱液", "精液", "濕透", "湿透",
    "情趣", "跳蛋", "按摩棒", "震動棒", "潤滑液", "手銬", "眼罩", "項圈", "絲襪", "网袜",
    "網襪", "丁字褲", "情趣內衣",
    "sex", "seggs", "fuck", "fucking", "cumming", "orgasm", "climax", "penetrate",
    "naked", "nude", "nsfw", "penis", "vagina", "nipple", "pussy", "cock", "dick",
    "horny", "blowjob", "handjob", "deepthroat", "doggy style", "missionary",
    "cowgirl", "thrust", "throbbing", "dripping wet", "masturbate", "fingering",
    "tits", "titjob", "milf", "lewd", "hentai", "ecchi", "oppai", "paizuri", "porn",
    "vibrator", "dildo", "stockings", "fishnet",
    "🍆", "🍑", "💦", "👅", "🥵", "🫦", "🔞", "❤️‍🔥",
    "s3x", "s.e.x", "f*ck", "f**k", "f.u.c.k", "fucc", "p0rn", "pr0n", "c0ck",
    "d1ck", "p*ssy", "onlyfans", "0nlyfans", "fansly",
];

/// Extreme or prohibited content. The illegal themes (minors, incest,
/// non-consent, bestiality) sit here so they always score maximum.
pub const LEVEL5_EXTREME: &[&str] = &[
    "狂操", "猛插", "爆射", "內射", "内射", "肛交", "顏射", "颜射", "群交", "輪姦", "轮奸",
    "輪流", "轮流", "調教", "调教", "綁縛", "绑缚", "捆綁", "捆绑", "主奴", "支配", "臣服",
    "羞辱", "窒息玩法", "潮吹", "失禁", "放蕩", "放荡", "淫蕩", "淫荡", "蹂躪", "蹂躏",
    "縱慾", "纵欲", "榨乾", "榨干", "狂射", "連續射精", "肏我", "操我", "插我", "幹我",
    "干我", "雞巴", "鸡巴", "性虐", "發騷", "发骚", "淫叫", "浪叫", "求歡", "求欢", "性慾",
    "性欲", "肉慾", "肉欲", "淫慾", "淫欲",
    "未成年", "未滿", "未满", "小學生", "小学生", "中學生", "中学生", "高中生", "蘿莉",
    "萝莉", "loli", "正太", "shota", "亂倫", "乱伦", "近親", "近亲", "母子", "父女", "兄妹",
    "姐弟", "強暴", "强暴", "強姦", "强奸", "迷姦", "迷奸", "迷藥", "迷药", "下藥", "下药",
    "強迫", "强迫", "非自願", "非自愿", "偷拍", "灌醉", "獸交", "兽交", "畜交",
    "gangbang", "threesome", "double penetration", "creampie", "squirt", "bondage",
    "bdsm", "dominate", "domination", "submissive", "breeding", "deep anal",
    "anal sex", "anal beads", "facial cumshot", "sex slave",
    "underage", "minor girl", "incest", "rape", "raped", "raping", "bestiality",
    "nonconsensual", "non-consent", "drugged", "roofies", "rohypnol", "spiked drink",
];

/// The five sets with their levels, low to high.
pub fn leveled_sets() -> [(&'static [&'static str], u8); 5] {
    [
        (LEVEL1_EVERYDAY, 1),
        (LEVEL2_ROMANTIC, 2),
        (LEVEL3_INTIMATE, 3),
        (LEVEL4_EXPLICIT, 4),
        (LEVEL5_EXTREME, 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sets_are_disjoint() {
        let mut seen: HashSet<&str> = HashSet::new();
        for (set, level) in leveled_sets() {
            for kw in set {
                assert!(seen.insert(kw), "keyword {kw:?} duplicated at level {level}");
            }
        }
    }

    #[test]
    fn keywords_are_lowercase() {
        for (set, _) in leveled_sets() {
            for kw in set {
                assert_eq!(*kw, kw.to_lowercase(), "keyword {kw:?} not lowercase");
            }
        }
    }
}
