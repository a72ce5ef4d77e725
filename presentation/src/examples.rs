/// A preset symptom description offered when the user types nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleCase {
    pub label: &'static str,
    pub language: &'static str,
    pub text: &'static str,
}

pub const EXAMPLES: &[ExampleCase] = &[
    ExampleCase {
        label: "Autoimmune Disease",
        language: "en",
        text: r#"I have experienced pericarditis in the past. I am currently feeling sensitive and sharp pain on the dorsal aspect of both wrists, as well as the palmar face of my right wrist. I also have pain in both shoulders. The intensity of the pain is an 8, and it is precisely located at an 8. The pain appeared suddenly and does not radiate to another location. I am experiencing shortness of breath and have difficulty breathing significantly. I smoke cigarettes and have high blood pressure. I have a red rash on my cheek and nose that is not swollen but larger than 1cm. The rash does not peel off, and the itching is not severe. Additionally, I have painful mouth ulcers."#,
    },
    ExampleCase {
        label: "Epiglottitis",
        language: "en",
        text: r#"I have a sharp knife-like pain in my right tonsil, left tonsil, back of the neck, palate, and pharynx. The intensity of the pain is a 7 out of 10 and it appeared fairly fast. I do regularly take stimulant drugs and have difficulty swallowing. I am experiencing shortness of breath and have diabetes. I do drink alcohol excessively and have noticed an increase in saliva production. I also have a high pitched sound when breathing in and my voice has become hoarse. My vaccinations are up to date and I have not traveled out of the country in the last 4 weeks."#,
    },
    ExampleCase {
        label: "Anaphylaxis",
        language: "en",
        text: r#"I have a known severe food allergy. I have been in contact with something that I am allergic to. I have a cramp and sharp pain in my flank (left side), iliac fossa (right side), and belly. The pain is intense, around a 6. The pain appeared quickly, an 8 out of 10. I feel lightheaded and dizzy, like I am about to faint. I have lesions on my skin that are pink in color, not peeling off, and swollen at a 4 out of 10 on my back of the neck, right bicep, left bicep, mouth, and right ankle. The pain caused by the rash is 0 out of 10 but the itching is very intense at 8 out of 10. I am feeling nauseous and have a swollen cheek on the right side and nose. I have noticed a high pitched sound when breathing in and wheezing when I exhale. I am more likely to develop common allergies than the general population."#,
    },
    ExampleCase {
        label: "Car Accident",
        language: "en",
        text: r#"Doctor, I wanted to share something concerning. I was in a car accident recently, and initially, I didn't feel much pain after the impact. However, now, about 24 hours later, my stomach is hurting terribly. It's been gradually getting worse since the accident, and I'm starting to feel concerned about it."#,
    },
    ExampleCase {
        label: "Lung Infection",
        language: "en",
        text: r#"Doctor, we've been feeling really rough lately. Both of us have had high fevers, chills, headaches, muscle aches, and just an overall feeling of exhaustion. And the coughing... it's been relentless, accompanied by this uncomfortable tightness in our chests. It all started about two weeks ago after we spent a day hiking in the mountains of Virginia. We ventured into this dusty cave, and since then, these symptoms have just been getting worse. We thought it might pass, but it's really knocking us down now."#,
    },
    ExampleCase {
        label: "Epiglottitis",
        language: "zh",
        text: r#"我的右扁桃体、左扁桃体、颈后、上颚和咽部都有刀割般的疼痛。疼痛的强度为 7 分（满分 10 分），而且疼痛的速度相当快。我确实经常服用兴奋剂并且吞咽困难。我感到呼吸急促并且患有糖尿病。我确实饮酒过量，并且注意到唾液分泌增加。我呼吸时声音也变高，声音也变得沙哑。我已接种最新疫苗，并且过去 4 周内没有出国旅行。"#,
    },
    ExampleCase {
        label: "Anaphylaxis",
        language: "zh",
        text: r#"我有严重的食物过敏。我接触过令我过敏的东西。我的侧腹（左侧）、髂窝（右侧）和腹部出现抽筋和剧烈疼痛。疼痛很剧烈，大约是 6 分。疼痛出现得很快，满分是 8 分。我感到头晕目眩，就像快要晕倒一样。我的皮肤上有粉红色的损伤，没有剥落，脖子后面、右二头肌、左二头肌、嘴和右脚踝处有十分之四的肿胀。皮疹引起的疼痛是十分之零，但瘙痒非常剧烈，十分之八。我感到恶心，右侧脸颊和鼻子肿胀。我注意到吸气时发出高亢的声音，呼气时发出喘息声。我比一般人更有可能出现常见过敏症。"#,
    },
    ExampleCase {
        label: "Epiglottitis",
        language: "tr",
        text: r#"sağ bademcikimde, sol bademcikimde, ensemde, damakta ve farenksimde bıçak gibi keskin bir ağrı var. Ağrının şiddeti 10 üzerinden 7 ve oldukça hızlı ortaya çıktı. Düzenli olarak uyarıcı ilaçlar alıyorum ve yutma güçlüğü çekiyorum. Nefes darlığı çekiyorum ve şeker hastasıyım. Aşırı alkol tüketiyorum ve tükürük üretimimin arttığını fark ettim. Ayrıca nefes alırken çok tiz bir ses duyuyorum ve sesim kısılıyor. Aşılarım güncel ve son 4 haftadır yurt dışına çıkmadım."#,
    },
    ExampleCase {
        label: "Anaphylaxis",
        language: "tr",
        text: r#"bilinen ciddi bir gıda alerjim var. Alerjim olan bir şeyle temas ettim. Yan tarafımda (sol tarafta), iliak fossada (sağ tarafta) ve karnımda kramp ve keskin bir ağrı var. Ağrı çok yoğun, 6 civarında. Ağrı hızlı bir şekilde ortaya çıktı, 10 üzerinden 8. Başım dönüyor ve bayılacakmış gibi başım dönüyor. Cildimde ensemde, sağ pazımda, sol pazımda, ağzımda ve sağ ayak bileğimde 10 üzerinden 4 oranında pembe renkte, soyulmayan ve şişmiş lezyonlar var. Kızarıklığın neden olduğu ağrı 10 üzerinden 0 ama kaşıntı 10 üzerinden 8 ile çok yoğun. Midem bulanıyor ve sağ tarafımda ve burnumda şiş bir yanağım var. Nefes alırken yüksek perdeden bir ses ve nefes verirken hırıltı fark ettim. Genel popülasyona göre yaygın alerjilere yakalanma olasılığım daha yüksektir."#,
    },
];

/// 1-based lookup, matching how examples are numbered on screen.
pub fn example(number: usize) -> Option<&'static ExampleCase> {
    number.checked_sub(1).and_then(|i| EXAMPLES.get(i))
}

pub fn display_name(number: usize, case: &ExampleCase) -> String {
    if case.language == "en" {
        format!("Example {number} - {}", case.label)
    } else {
        format!("Example {number} - {} - {}", case.language, case.label)
    }
}
